//! Re-entrancy tests

// Imports
use {
	core::{mem, panic::AssertUnwindSafe},
	proxima_store::{Dependencies, Dependency, Store, SubscriberId},
	proxima_sync_types::{IMut, IMutExt, Rc},
	proxima_value::{FieldAccess, Key, Object, Value},
	std::panic,
};

/// Shared log of events
type Log = Rc<IMut<Vec<String>>>;

fn push(log: &Log, event: impl Into<String>) {
	log.imut_write().push(event.into());
}

fn take(log: &Log) -> Vec<String> {
	mem::take(&mut *log.imut_write())
}

/// Writes field `key` of the store's value
fn write(store: &Store, key: &str, value: impl Into<Value>) {
	store.get().set(Key::new(key), value.into());
}

/// Subscribing from within a callback only affects the next dispatch
#[test]
fn subscribe_during_dispatch() {
	let store = Store::new(Object::from_iter([("a", 0)])).expect("Unable to create store");
	let log = Log::default();

	let weak = store.downgrade();
	let subscribed = Rc::new(IMut::new(false));
	_ = store.subscribe(
		{
			let log = Rc::clone(&log);
			move |_| {
				push(&log, "outer");
				let Some(store) = weak.upgrade() else { return };
				if mem::replace(&mut *subscribed.imut_write(), true) {
					return;
				}

				let log = Rc::clone(&log);
				_ = store.subscribe(move |_| push(&log, "inner"), |_| (), Dependencies::All);
			}
		},
		|_| (),
		Dependencies::All,
	);

	write(&store, "a", 1);
	assert_eq!(take(&log), ["outer"], "Subscriber added mid-dispatch was called");

	write(&store, "a", 2);
	assert_eq!(take(&log), ["outer", "inner"]);
	assert_eq!(store.subscriber_count(), 2);
}

/// Unsubscribing from within a callback only affects the next dispatch
#[test]
fn unsubscribe_during_dispatch() {
	let store = Store::new(Object::from_iter([("a", 0)])).expect("Unable to create store");
	let log = Log::default();

	let target = Rc::new(IMut::new(None::<SubscriberId>));
	let weak = store.downgrade();
	_ = store.subscribe(
		{
			let log = Rc::clone(&log);
			let target = Rc::clone(&target);
			move |_| {
				push(&log, "first");
				if let Some(store) = weak.upgrade() &&
					let Some(id) = *target.imut_read()
				{
					store.unsubscribe(id);
					store.unsubscribe(id);
				}
			}
		},
		|_| (),
		Dependencies::All,
	);
	let id = store.subscribe(
		{
			let log = Rc::clone(&log);
			move |_| push(&log, "second")
		},
		|_| (),
		Dependencies::All,
	);
	*target.imut_write() = Some(id);

	write(&store, "a", 1);
	assert_eq!(take(&log), ["first", "second"], "In-flight dispatch was affected");

	write(&store, "a", 2);
	assert_eq!(take(&log), ["first"], "Unsubscribed subscriber was called");
}

/// A subscriber may unsubscribe itself while being dispatched
#[test]
fn unsubscribe_self() {
	let store = Store::new(Object::from_iter([("a", 0)])).expect("Unable to create store");
	let log = Log::default();

	let this = Rc::new(IMut::new(None::<SubscriberId>));
	let weak = store.downgrade();
	let id = store.subscribe(
		{
			let log = Rc::clone(&log);
			let this = Rc::clone(&this);
			move |_| {
				push(&log, "once");
				if let Some(store) = weak.upgrade() &&
					let Some(id) = *this.imut_read()
				{
					store.unsubscribe(id);
				}
			}
		},
		|_| (),
		Dependencies::All,
	);
	*this.imut_write() = Some(id);

	write(&store, "a", 1);
	write(&store, "a", 2);
	assert_eq!(take(&log), ["once"]);
	assert_eq!(store.subscriber_count(), 0);
}

/// Removing a subscriber that owns a subscription to the same store
#[test]
fn unsubscribe_owner_of_subscription() {
	let store = Store::new(Object::from_iter([("a", 0)])).expect("Unable to create store");

	let inner = store.watch(|_| (), |_| (), Dependencies::All);
	let outer = store.subscribe(
		move |_| {
			let _inner = &inner;
		},
		|_| (),
		Dependencies::All,
	);
	assert_eq!(store.subscriber_count(), 2);

	store.unsubscribe(outer);
	assert_eq!(store.subscriber_count(), 0, "Owned subscription wasn't dropped");
}

/// Writes from within a callback are dispatched before the outer write returns
#[test]
fn write_during_dispatch() {
	let store = Store::new(Object::from_iter([("celsius", 0), ("fahrenheit", 32)])).expect("Unable to create store");
	let log = Log::default();

	let weak = store.downgrade();
	_ = store.subscribe(
		move |event| {
			let Some(store) = weak.upgrade() else { return };
			let celsius = event.current.as_number().unwrap_or_default();
			store
				.get()
				.set(Key::new("fahrenheit"), Value::from(celsius * 9.0 / 5.0 + 32.0));
		},
		|_| (),
		[Dependency::from("celsius")],
	);
	_ = store.subscribe(
		{
			let log = Rc::clone(&log);
			move |event| push(&log, format!("{}: {:?} -> {:?}", event.property, event.previous, event.current))
		},
		|_| (),
		Dependencies::All,
	);

	write(&store, "celsius", 100);
	assert_eq!(take(&log), ["fahrenheit: 32 -> 212", "celsius: 0 -> 100"]);
	assert_eq!(store.get().get(&Key::new("fahrenheit")), Value::from(212));
}

/// Replacing the value from within a callback
#[test]
fn set_during_dispatch() {
	let store = Store::new(Object::from_iter([("reset", false)])).expect("Unable to create store");
	let log = Log::default();

	let weak = store.downgrade();
	_ = store.subscribe(
		move |event| {
			if event.current.as_bool() == Some(true) &&
				let Some(store) = weak.upgrade()
			{
				_ = store.set(Object::from_iter([("reset", false)]));
			}
		},
		{
			let log = Rc::clone(&log);
			move |event| push(&log, format!("reinit {:?}", event.current))
		},
		[Dependency::from("reset")],
	);

	let before = store.get();
	write(&store, "reset", true);
	assert_eq!(take(&log), ["reinit {reset: false}"]);
	assert!(!before.as_live().is_some_and(|view| view.is_attached()));
	assert_eq!(store.get().get(&Key::new("reset")), Value::from(false));
}

/// A panicking subscriber doesn't prevent the others from being notified
#[test]
fn panic_isolation() {
	let log = Log::default();
	let store = Store::builder(Object::from_iter([("a", 0)]))
		.on_change({
			let log = Rc::clone(&log);
			move |_| push(&log, "listener")
		})
		.build()
		.expect("Unable to create store");

	_ = store.subscribe(
		{
			let log = Rc::clone(&log);
			move |_| push(&log, "before")
		},
		|_| (),
		Dependencies::All,
	);
	_ = store.subscribe(|_| panic!("Subscriber failed"), |_| panic!("Subscriber failed"), Dependencies::All);
	_ = store.subscribe(
		|_| (),
		|_| (),
		[Dependency::predicate(|_, _, _, _| panic!("Predicate failed"))],
	);
	_ = store.subscribe(
		{
			let log = Rc::clone(&log);
			move |_| push(&log, "after")
		},
		{
			let log = Rc::clone(&log);
			move |_| push(&log, "after reinit")
		},
		Dependencies::All,
	);

	let res = panic::catch_unwind(AssertUnwindSafe(|| write(&store, "a", 1)));
	let payload = res.expect_err("Panic should be resumed after dispatch");
	assert_eq!(payload.downcast_ref::<&str>(), Some(&"Subscriber failed"));
	assert_eq!(take(&log), ["before", "after", "listener"]);

	// The store keeps working afterwards
	assert_eq!(store.get().get(&Key::new("a")), Value::from(1));
	assert_eq!(store.subscriber_count(), 4);

	let res = panic::catch_unwind(AssertUnwindSafe(|| store.set(Value::Null)));
	assert!(res.is_err(), "Panic should be resumed after reinit dispatch");
	assert_eq!(take(&log), ["after reinit"]);
	assert!(store.get().is(&Value::Null));
}

#[cfg(feature = "sync")]
#[test]
fn concurrent_writes() {
	use std::{
		sync::atomic::{self, AtomicUsize},
		thread,
	};

	const THREADS: usize = 4;
	const WRITES: usize = 100;

	let store = Store::new(Object::from_iter([("count", 0)])).expect("Unable to create store");
	let changes = Rc::new(AtomicUsize::new(0));
	_ = store.subscribe(
		{
			let changes = Rc::clone(&changes);
			move |_| {
				changes.fetch_add(1, atomic::Ordering::Relaxed);
			}
		},
		|_| (),
		Dependencies::All,
	);

	thread::scope(|s| {
		for _ in 0..THREADS {
			s.spawn(|| {
				for _ in 0..WRITES {
					let current = store.get();
					if let Some(view) = current.as_live() {
						let count = view.get(&Key::new("count")).as_number().unwrap_or_default();
						view.set(Key::new("count"), Value::from(count + 1.0));
					}
				}
			});
		}
	});

	assert_eq!(changes.load(atomic::Ordering::Relaxed), THREADS * WRITES);
}
