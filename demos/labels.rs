//! Stores several values of the same type under different discriminators,
//! and a few structurally identical types that must never be confused.
//!
//! Run with: cargo run --example labels

use sovran_typeregistry::{ErasedKey, Key, RegistryError, TypeRegistry};

#[derive(Clone, Debug)]
struct Meters(f64);

#[derive(Clone, Debug)]
struct Feet(f64);

fn main() -> Result<(), RegistryError> {
    tracing_subscriber::fmt::init();

    let profile = TypeRegistry::<String>::new();

    profile.put(&Key::named("nickname"), "Ace".to_string())?;
    profile.put(&Key::named("title"), "Captain".to_string())?;
    profile.put(&Key::of(), Meters(1.85))?;

    // Same layout, different type: nothing is stored under Feet
    match profile.get(&Key::<Feet>::of())? {
        Some(feet) => println!("height: {} ft", feet.0),
        None => println!("no height in feet"),
    }
    if let Some(height) = profile.get(&Key::<Meters>::of())? {
        println!("height: {} m", height.0);
    }

    // Renaming replaces the nickname, leaving the title alone
    profile.put(&Key::named("nickname"), "Maverick".to_string())?;

    println!("\nString labels:");
    for key in profile.keys_of::<String>()? {
        let label = key.discriminator().cloned().unwrap_or_default();
        if let Some(typed) = key.downcast::<String>() {
            let value = profile.get(&typed)?.unwrap_or_default();
            println!("  {} = {}", label, value);
        }
    }

    // Values arriving without a static type are checked on the way in
    let dynamic = ErasedKey::of::<Meters>();
    if let Err(e) = profile.insert_boxed(dynamic, Box::new(Feet(6.07))) {
        println!("\nrejected: {}", e);
    }

    Ok(())
}
