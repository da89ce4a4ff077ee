//! Walkthrough of `proxima`.
//!
//! Provides a store to a context, subscribes a few consumers to it, each
//! listening to different fields, and logs every notification they receive.
//!
//! Run with `RUST_LOG=trace` to also see the store's internals.

// Imports
use {
	anyhow::Context,
	proxima_context::{ContextError, StoreContext},
	proxima_store::{Dependency, Store, Subscription},
	proxima_value::{FieldAccess, Function, Key, Object, Value},
};

fn main() -> Result<(), anyhow::Error> {
	proxima_logger::init();

	let ctx = StoreContext::new("AppContext");
	let store = Store::builder(Object::from_iter([("a", 1), ("b", 2), ("c", 3)]))
		.name("app")
		.on_change(|event| {
			tracing::info!(property = %event.property, current = ?event.current, previous = ?event.previous, "App change");
		})
		.on_reinit(|event| {
			tracing::info!(current = ?event.current, previous = ?event.previous, is_initial = event.is_initial, "App reinit");
		})
		.build()
		.context("Unable to create store")?;
	let _handle = ctx.provide(store);

	// Each consumer listens to the fields in it's key, and to reinits if it contains `1`
	let _consumers = ["a", "ab", "bc1", ""]
		.into_iter()
		.map(|consumer_key| self::consumer(&ctx, consumer_key))
		.collect::<Result<Vec<_>, _>>()?;

	tracing::info!("Writing fields");
	let value = ctx.store()?.get();
	value.set(Key::new("a"), Value::from(2));
	value.set(Key::new("b"), Value::from(3));
	value.set(Key::new("c"), Value::from(3));

	tracing::info!("Replacing the value");
	_ = ctx.store()?.set(Object::from_iter([("a", 5), ("b", 5), ("c", 5)]));

	tracing::info!("Writing through the old value");
	value.set(Key::new("a"), Value::from(6));

	self::settings().context("Unable to run settings")?;
	self::counter().context("Unable to run counter")?;

	Ok(())
}

/// Subscribes a consumer to `ctx`
fn consumer(ctx: &StoreContext, consumer_key: &'static str) -> Result<Subscription, ContextError> {
	let deps = ["a", "b", "c"].map(|key| consumer_key.contains(key).then_some(key));
	let with_reinit = consumer_key.contains('1');

	ctx.subscribe(
		move |event| {
			tracing::info!(consumer_key, property = %event.property, current = ?event.current, previous = ?event.previous, "Consumer change");
		},
		move |event| {
			if with_reinit {
				tracing::info!(consumer_key, current = ?event.current, previous = ?event.previous, "Consumer reinit");
			}
		},
		deps,
	)
}

/// Shows path and predicate dependencies, and setters normalizing writes
fn settings() -> Result<(), anyhow::Error> {
	let theme = Object::from_iter([("color", "dark"), ("font", "mono")]);
	let settings = Object::from_iter([("theme", Value::from(theme)), ("volume", Value::from(5))]).with_setter(
		"volume",
		|fields, value| {
			let volume = value.as_number().unwrap_or_default().clamp(0.0, 10.0);
			_ = fields.insert(Key::new("volume"), Value::from(volume));
		},
	);
	let store = Store::builder(settings).name("settings").build()?;

	let _color = store.watch(
		|event| tracing::info!(current = ?event.current, previous = ?event.previous, "Theme color changed"),
		|_| (),
		[["theme", "color"]],
	);
	let _loud = store.watch(
		|event| tracing::info!(current = ?event.current, "Volume is loud"),
		|_| (),
		[Dependency::predicate(|property, current, _, _| {
			property == "volume" && current.as_number().is_some_and(|volume| volume >= 8.0)
		})],
	);

	let value = store.get();

	// Only the font differs, so the color subscriber isn't notified
	value.set(Key::new("theme"), Value::from(Object::from_iter([("color", "dark"), ("font", "serif")])));
	value.set(Key::new("theme"), Value::from(Object::from_iter([("color", "light")])));

	// Clamped to `10` by the setter
	value.set(Key::new("volume"), Value::from(42));
	tracing::info!(volume = ?value.get(&Key::new("volume")), "Volume after clamping");

	Ok(())
}

/// Shows methods writing through the store, even after it's value is replaced
fn counter() -> Result<(), anyhow::Error> {
	let increment = Function::new(|this, _| {
		let count = this.get(&Key::new("count")).as_number().unwrap_or_default();
		this.set(Key::new("count"), Value::from(count + 1.0));
		Value::Undefined
	});

	let store = Store::builder(Object::from_iter([("count", Value::from(0)), ("increment", Value::from(increment))]))
		.name("counter")
		.on_change(|event| tracing::info!(property = %event.property, current = ?event.current, "Counter change"))
		.build()?;

	let method = store.get().get(&Key::new("increment"));
	let method = method.as_function().context("Counter should have an increment method")?;

	_ = method.call(&Value::Undefined, &[]);
	_ = store.set(Object::from_iter([("count", 10)]));
	_ = method.call(&Value::Undefined, &[]);

	tracing::info!(count = ?store.get().get(&Key::new("count")), "Final count");
	Ok(())
}
