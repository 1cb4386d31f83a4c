use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use perch_state::StateBundle;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::config::{KindConflictPolicy, UnknownKindPolicy};
use crate::presenter::ViewSlot;

trait CounterView: Send + Sync {
	fn show(&self, count: i64);
}

#[derive(Default)]
struct Screen {
	shown: Mutex<Vec<i64>>,
}

impl CounterView for Screen {
	fn show(&self, count: i64) {
		self.shown.lock().push(count);
	}
}

fn screen() -> (Arc<Screen>, Arc<dyn CounterView>) {
	let screen = Arc::new(Screen::default());
	let view: Arc<dyn CounterView> = screen.clone();
	(screen, view)
}

struct Counter {
	count: AtomicI64,
	slot: ViewSlot<dyn CounterView>,
	dropped: AtomicUsize,
	destroyed: AtomicUsize,
}

impl Counter {
	fn with_count(count: i64) -> Self {
		Self {
			count: AtomicI64::new(count),
			slot: ViewSlot::new(),
			dropped: AtomicUsize::new(0),
			destroyed: AtomicUsize::new(0),
		}
	}

	fn count(&self) -> i64 {
		self.count.load(Ordering::SeqCst)
	}

	fn increment(&self) {
		let count = self.count.fetch_add(1, Ordering::SeqCst) + 1;
		if let Some(view) = self.view() {
			view.show(count);
		}
	}
}

impl Presenter for Counter {
	const KIND: &'static str = "counter";
	type View = dyn CounterView;

	fn create() -> anyhow::Result<Self> {
		Ok(Self::with_count(0))
	}

	fn restore(state: &StateBundle) -> anyhow::Result<Self> {
		Ok(Self::with_count(state.require_int("count")?))
	}

	fn save(&self, state: &mut StateBundle) {
		state.put("count", self.count());
	}

	fn view_slot(&self) -> &ViewSlot<dyn CounterView> {
		&self.slot
	}

	fn on_take_view(&self, view: &Arc<dyn CounterView>) {
		view.show(self.count());
	}

	fn on_drop_view(&self) {
		self.dropped.fetch_add(1, Ordering::SeqCst);
	}

	fn on_destroy(&self) {
		self.destroyed.fetch_add(1, Ordering::SeqCst);
	}
}

#[derive(Default)]
struct Timer {
	slot: ViewSlot<()>,
}

impl Presenter for Timer {
	const KIND: &'static str = "timer";
	type View = ();

	fn create() -> anyhow::Result<Self> {
		Ok(Self::default())
	}

	fn view_slot(&self) -> &ViewSlot<()> {
		&self.slot
	}
}

/// Claims the "counter" kind with a different type.
#[derive(Default)]
struct Impostor {
	slot: ViewSlot<()>,
}

impl Presenter for Impostor {
	const KIND: &'static str = "counter";
	type View = ();

	fn create() -> anyhow::Result<Self> {
		Ok(Self::default())
	}

	fn view_slot(&self) -> &ViewSlot<()> {
		&self.slot
	}
}

struct Broken {
	slot: ViewSlot<()>,
}

impl Presenter for Broken {
	const KIND: &'static str = "broken";
	type View = ();

	fn create() -> anyhow::Result<Self> {
		anyhow::bail!("backing store unavailable")
	}

	fn view_slot(&self) -> &ViewSlot<()> {
		&self.slot
	}
}

struct Host {
	id: ViewId,
	decl: Option<PresenterDecl>,
}

impl Host {
	fn declaring<P: Presenter>() -> Self {
		Self {
			id: ViewId::next(),
			decl: Some(PresenterDecl::of::<P>()),
		}
	}

	fn bare() -> Self {
		Self { id: ViewId::next(), decl: None }
	}
}

impl PresenterView for Host {
	fn view_id(&self) -> ViewId {
		self.id
	}

	fn presenter_decl(&self) -> Option<PresenterDecl> {
		self.decl
	}
}

fn counter(handle: &PresenterHandle) -> Arc<Counter> {
	handle.downcast::<Counter>().expect("counter presenter")
}

fn printed(registry: &PresenterRegistry) -> String {
	let mut out = String::new();
	registry.print(&mut out).unwrap();
	out
}

#[test]
fn test_fresh_view_gets_new_presenter() {
	let registry = PresenterRegistry::new();
	let host = Host::declaring::<Counter>();

	let handle = registry.provide(&host, None).unwrap();
	assert_eq!(handle.kind(), "counter");
	assert!(handle.is::<Counter>());
	assert_eq!(counter(&handle).count(), 0);

	let out = printed(&registry);
	let lines: Vec<&str> = out.lines().collect();
	assert_eq!(lines.len(), 2, "header plus one entry: {out}");
	assert_eq!(lines[0], "1 live presenter(s)");
	assert_eq!(lines[1], format!("{} counter lineage={} views=[{}]", handle.id(), handle.lineage(), host.id));
}

#[test]
fn test_provide_is_idempotent_per_view() {
	let registry = PresenterRegistry::new();
	let host = Host::declaring::<Counter>();

	let first = registry.provide(&host, None).unwrap();
	let token = registry.save(&first).unwrap();
	let second = registry.provide(&host, None).unwrap();
	let third = registry.provide(&host, Some(&RestorationToken::new("counter", StateBundle::new().with("count", 99)))).unwrap();
	let fourth = registry.provide(&host, Some(&token)).unwrap();

	assert_eq!(first, second);
	assert_eq!(first, third);
	assert_eq!(first, fourth);
	assert_eq!(counter(&third).count(), 0);
	assert_eq!(registry.len(), 1);
}

#[test]
fn test_detached_view_keeps_presenter() {
	let registry = PresenterRegistry::new();
	let host = Host::declaring::<Counter>();
	let (screen, view) = screen();

	let handle = registry.provide(&host, None).unwrap();
	let presenter = counter(&handle);
	presenter.take_view(&view);
	presenter.increment();
	presenter.drop_view();

	assert!(registry.contains(handle.id()));
	assert!(!handle.has_view());
	assert_eq!(presenter.destroyed.load(Ordering::SeqCst), 0);

	let again = registry.provide(&host, None).unwrap();
	assert_eq!(again, handle);
	counter(&again).take_view(&view);
	assert_eq!(*screen.shown.lock(), vec![0, 1, 1]);
}

#[test]
fn test_recreated_view_with_live_lineage_is_rebound() {
	let registry = PresenterRegistry::new();
	let old_host = Host::declaring::<Counter>();

	let handle = registry.provide(&old_host, None).unwrap();
	counter(&handle).increment();
	let token = registry.save(&handle).unwrap();
	assert_eq!(token.lineage(), Some(handle.lineage()));

	let new_host = Host::declaring::<Counter>();
	let rebound = registry.provide(&new_host, Some(&token)).unwrap();
	assert_eq!(rebound, handle);
	assert_eq!(registry.len(), 1);

	let records = registry.snapshots();
	let mut expected = vec![old_host.id, new_host.id];
	expected.sort();
	assert_eq!(records[0].views, expected);

	assert_eq!(registry.release(old_host.id), Some(handle.id()));
	assert_eq!(registry.snapshots()[0].views, vec![new_host.id]);
	assert_eq!(registry.presenter_for(old_host.id), None);
	assert_eq!(registry.release(old_host.id), None);
}

#[test]
fn test_restore_after_process_death() {
	let before = PresenterRegistry::new();
	let handle = before.provide(&Host::declaring::<Counter>(), None).unwrap();
	for _ in 0..3 {
		counter(&handle).increment();
	}
	let bytes = before.save(&handle).unwrap().to_bytes().unwrap();
	drop(before);

	let after = PresenterRegistry::new();
	let token = RestorationToken::from_bytes(&bytes).unwrap();
	let restored = after.provide(&Host::declaring::<Counter>(), Some(&token)).unwrap();

	assert_ne!(restored.id(), handle.id());
	assert_eq!(restored.lineage(), handle.lineage());
	assert_eq!(counter(&restored).count(), 3);
}

#[test]
fn test_restore_handwritten_token() {
	let registry = PresenterRegistry::new();
	let token = RestorationToken::new("counter", StateBundle::new().with("count", 5));

	let handle = registry.provide(&Host::declaring::<Counter>(), Some(&token)).unwrap();
	assert_eq!(counter(&handle).count(), 5);

	let resaved = registry.save(&handle).unwrap();
	assert_eq!(resaved.lineage(), Some(handle.lineage()));
	assert_eq!(resaved.state().get_int("count"), Some(5));
}

#[test]
fn test_registered_kind_restores_for_bare_view() {
	let registry = PresenterRegistry::new();
	registry.register::<Counter>().unwrap();

	let token = RestorationToken::new("counter", StateBundle::new().with("count", 2));
	let handle = registry.provide(&Host::bare(), Some(&token)).unwrap();
	assert_eq!(counter(&handle).count(), 2);
}

#[test]
fn test_no_declaration_and_no_token_fails() {
	let registry = PresenterRegistry::new();
	let host = Host::bare();

	match registry.provide(&host, None) {
		Err(RegistryError::NoPresenterDeclared { view }) => assert_eq!(view, host.id),
		other => panic!("expected NoPresenterDeclared, got {other:?}"),
	}
	assert!(registry.is_empty());
}

#[test]
fn test_constructor_failure_is_surfaced() {
	let registry = PresenterRegistry::new();

	match registry.provide(&Host::declaring::<Broken>(), None) {
		Err(RegistryError::Construction { kind, source }) => {
			assert_eq!(kind, "broken");
			assert_eq!(source.to_string(), "backing store unavailable");
		}
		other => panic!("expected Construction, got {other:?}"),
	}

	let token = RestorationToken::new("counter", StateBundle::new().with("count", "five"));
	let err = registry.provide(&Host::declaring::<Counter>(), Some(&token)).unwrap_err();
	assert!(matches!(err, RegistryError::Construction { kind: "counter", .. }), "unexpected error: {err:?}");
	assert!(registry.is_empty());
}

#[test]
fn test_unknown_kind_falls_back_to_declaration() {
	let registry = PresenterRegistry::new();
	let token = RestorationToken::new("retired", StateBundle::new());

	let handle = registry.provide(&Host::declaring::<Counter>(), Some(&token)).unwrap();
	assert_eq!(handle.kind(), "counter");

	match registry.provide(&Host::bare(), Some(&token)) {
		Err(RegistryError::NoPresenterDeclared { .. }) => {}
		other => panic!("expected NoPresenterDeclared, got {other:?}"),
	}
}

#[test]
fn test_unknown_kind_rejected_by_policy() {
	let registry = PresenterRegistry::with_config(RegistryConfig {
		unknown_kind: UnknownKindPolicy::Reject,
		..RegistryConfig::default()
	});
	let token = RestorationToken::new("retired", StateBundle::new());

	match registry.provide(&Host::declaring::<Counter>(), Some(&token)) {
		Err(RegistryError::UnregisteredKind { kind }) => assert_eq!(kind, "retired"),
		other => panic!("expected UnregisteredKind, got {other:?}"),
	}
}

#[test]
fn test_kind_conflict_policies() {
	let token = RestorationToken::new("counter", StateBundle::new().with("count", 4));

	let by_token = PresenterRegistry::new();
	by_token.register::<Counter>().unwrap();
	let handle = by_token.provide(&Host::declaring::<Timer>(), Some(&token)).unwrap();
	assert_eq!(handle.kind(), "counter");

	let by_decl = PresenterRegistry::with_config(RegistryConfig {
		kind_conflict: KindConflictPolicy::Declaration,
		..RegistryConfig::default()
	});
	by_decl.register::<Counter>().unwrap();
	let handle = by_decl.provide(&Host::declaring::<Timer>(), Some(&token)).unwrap();
	assert_eq!(handle.kind(), "timer");

	// A live lineage of another kind is not rebound either.
	let live = by_decl.provide(&Host::declaring::<Counter>(), None).unwrap();
	let live_token = by_decl.save(&live).unwrap();
	let handle = by_decl.provide(&Host::declaring::<Timer>(), Some(&live_token)).unwrap();
	assert_eq!(handle.kind(), "timer");
	assert_ne!(handle.lineage(), live.lineage());
	assert_eq!(by_decl.presenter_of_lineage(live.lineage()), Some(live.clone()));
	assert_eq!(by_decl.len(), 3);

	let rebound = by_token.provide(&Host::declaring::<Counter>(), None).unwrap();
	let rebound_token = by_token.save(&rebound).unwrap();
	assert_eq!(by_token.provide(&Host::declaring::<Timer>(), Some(&rebound_token)).unwrap(), rebound);
}

#[test]
fn test_register_rejects_kind_collisions() {
	let registry = PresenterRegistry::new();
	registry.register::<Counter>().unwrap();
	registry.register::<Counter>().unwrap();
	assert!(registry.is_registered("counter"));
	assert!(!registry.is_registered("timer"));

	match registry.register::<Impostor>() {
		Err(RegistryError::DuplicateKind { kind }) => assert_eq!(kind, "counter"),
		other => panic!("expected DuplicateKind, got {other:?}"),
	}
}

#[test]
fn test_destroy_is_idempotent() {
	let registry = PresenterRegistry::new();
	let host = Host::declaring::<Counter>();
	let handle = registry.provide(&host, None).unwrap();
	let presenter = counter(&handle);

	registry.destroy(&handle);
	let after_first = printed(&registry);
	registry.destroy(&handle);

	assert_eq!(printed(&registry), after_first);
	assert_eq!(presenter.destroyed.load(Ordering::SeqCst), 1);
	assert!(!registry.contains(handle.id()));
	assert_eq!(registry.get(handle.id()), None);
	assert_eq!(registry.presenter_for(host.id), None);

	match registry.save(&handle) {
		Err(RegistryError::UnknownPresenter { id }) => assert_eq!(id, handle.id()),
		other => panic!("expected UnknownPresenter, got {other:?}"),
	}

	let replacement = registry.provide(&host, None).unwrap();
	assert_ne!(replacement.id(), handle.id());
	assert_ne!(replacement.lineage(), handle.lineage());
}

#[test]
fn test_destroy_detaches_active_view() {
	let registry = PresenterRegistry::new();
	let handle = registry.provide(&Host::declaring::<Counter>(), None).unwrap();
	let presenter = counter(&handle);
	let (_screen, view) = screen();

	presenter.take_view(&view);
	assert!(handle.has_view());

	registry.destroy(&handle);
	assert!(presenter.view().is_none());
	assert_eq!(presenter.dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_destroy_in_another_registry_is_a_noop() {
	let owner = PresenterRegistry::new();
	let stranger = PresenterRegistry::new();
	let handle = owner.provide(&Host::declaring::<Counter>(), None).unwrap();

	stranger.destroy(&handle);
	assert!(owner.contains(handle.id()));
	assert_eq!(counter(&handle).destroyed.load(Ordering::SeqCst), 0);
	assert!(matches!(stranger.save(&handle), Err(RegistryError::UnknownPresenter { .. })));
}

#[test]
fn test_take_view_replaces_previous_view() {
	let presenter = Counter::with_count(7);
	let (first, first_view) = screen();
	let (second, second_view) = screen();

	presenter.take_view(&first_view);
	presenter.take_view(&second_view);
	presenter.increment();
	assert_eq!(*first.shown.lock(), vec![7]);
	assert_eq!(*second.shown.lock(), vec![7, 8]);

	presenter.drop_view();
	presenter.drop_view();
	presenter.increment();
	assert!(presenter.view().is_none());
	assert_eq!(*second.shown.lock(), vec![7, 8]);
	assert_eq!(presenter.dropped.load(Ordering::SeqCst), 1);
}

#[test]
fn test_view_slot_does_not_keep_view_alive() {
	let presenter = Counter::with_count(0);
	let (screen, view) = screen();
	presenter.take_view(&view);
	drop(view);
	drop(screen);

	assert!(presenter.view().is_none());
}

#[test]
fn test_destroy_all_tears_down_everything() {
	let registry = PresenterRegistry::new();
	let a = registry.provide(&Host::declaring::<Counter>(), None).unwrap();
	let b = registry.provide(&Host::declaring::<Timer>(), None).unwrap();

	let ids = registry.destroy_all();
	assert_eq!(ids, vec![a.id(), b.id()]);
	assert!(registry.is_empty());
	assert_eq!(counter(&a).destroyed.load(Ordering::SeqCst), 1);
	assert_eq!(printed(&registry), "0 live presenter(s)\n");
}

#[test]
fn test_concurrent_readers_during_provide() {
	let registry = PresenterRegistry::new();
	let seed = registry.provide(&Host::declaring::<Counter>(), None).unwrap();

	std::thread::scope(|s| {
		s.spawn(|| {
			for _ in 0..64 {
				registry.provide(&Host::declaring::<Counter>(), None).unwrap();
			}
		});
		s.spawn(|| {
			for _ in 0..64 {
				let mut out = String::new();
				registry.print(&mut out).unwrap();
				assert!(registry.save(&seed).is_ok());
			}
		});
	});

	assert_eq!(registry.len(), 65);
}

#[derive(Debug, Clone)]
enum Op {
	Provide { view: usize, token: Option<usize> },
	Save { view: usize },
	Destroy { view: usize },
	Release { view: usize },
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		(0..6usize, proptest::option::of(0..8usize)).prop_map(|(view, token)| Op::Provide { view, token }),
		(0..6usize).prop_map(|view| Op::Save { view }),
		(0..6usize).prop_map(|view| Op::Destroy { view }),
		(0..6usize).prop_map(|view| Op::Release { view }),
	]
}

proptest! {
	#[test]
	fn prop_at_most_one_presenter_per_lineage(ops in proptest::collection::vec(op(), 1..64)) {
		let registry = PresenterRegistry::new();
		let hosts: Vec<Host> = (0..6).map(|_| Host::declaring::<Counter>()).collect();
		let mut tokens: Vec<RestorationToken> = Vec::new();

		for op in ops {
			match op {
				Op::Provide { view, token } => {
					let token = token.and_then(|i| tokens.get(i));
					registry.provide(&hosts[view], token).unwrap();
				}
				Op::Save { view } => {
					if let Some(handle) = registry.presenter_for(hosts[view].id) {
						tokens.push(registry.save(&handle).unwrap());
					}
				}
				Op::Destroy { view } => {
					if let Some(handle) = registry.presenter_for(hosts[view].id) {
						registry.destroy(&handle);
					}
				}
				Op::Release { view } => {
					registry.release(hosts[view].id);
				}
			}

			let records = registry.snapshots();
			let lineages: HashSet<Lineage> = records.iter().map(|r| r.lineage).collect();
			prop_assert_eq!(lineages.len(), records.len());

			let mut seen = HashSet::new();
			for view in records.iter().flat_map(|r| r.views.iter()) {
				prop_assert!(seen.insert(*view), "view {} bound twice", view);
			}
		}
	}
}
