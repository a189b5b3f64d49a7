//! Specs: Naming the Dimensions of Nested Data
//!
//! Run with: cargo run --example specs
//!
//! This example demonstrates:
//! - Describing a data tree with a spec
//! - Reading dimension sizes and slicing along a dimension
//! - The dimension algebra (remove, add, replace)
//! - Resolving a symbolic Axis to concrete indices

use dimflow_core::{concretize_axes, path, validate, Args, Axis, Spec, Tensor, Tree};

fn main() {
    println!("=== Specs ===\n");

    // -------------------------------------------------------------------------
    // Data and its spec
    // -------------------------------------------------------------------------
    println!("1. Data and its Spec");
    println!("--------------------");

    let data = Tree::map([
        ("signals", Tree::leaf(Tensor::arange(vec![6, 3]))),
        ("positions", Tree::leaf(Tensor::arange(vec![3, 2]))),
    ]);
    let spec = Spec::map([
        ("signals", Spec::dims(["time", "receiver"])),
        ("positions", Spec::dims(["receiver", "xyz"])),
    ]);
    println!("spec:  {}", spec);
    match validate(&spec, &data) {
        Ok(sizes) => println!("sizes: {:?}", sizes),
        Err(err) => println!("invalid: {}", err),
    }
    println!();

    // -------------------------------------------------------------------------
    // Slicing
    // -------------------------------------------------------------------------
    println!("2. Selecting one receiver");
    println!("-------------------------");

    match spec.select(&data, "receiver", 1) {
        Ok((sliced, reduced)) => {
            println!("reduced spec: {}", reduced);
            println!("signals[:, 1] = {:?}", sliced.get(&path!["signals"]).ok());
        }
        Err(err) => println!("error: {}", err),
    }
    println!();

    // -------------------------------------------------------------------------
    // Algebra
    // -------------------------------------------------------------------------
    println!("3. Dimension algebra");
    println!("--------------------");

    println!("remove time:      {}", spec.remove_dimension("time"));
    if let Ok(added) = spec.add_dimension("frame", &path!["signals"], 0) {
        println!("add frame:        {}", added);
    }
    if let Ok(replaced) = spec.replace(&Spec::map([("positions", Spec::absent())])) {
        println!("drop positions:   {}", replaced);
    }
    println!();

    // -------------------------------------------------------------------------
    // Axes
    // -------------------------------------------------------------------------
    println!("4. Concretizing Axis(\"receiver\")");
    println!("--------------------------------");

    match concretize_axes(&spec, &Args::new().with(Axis::new("receiver"))) {
        Ok(args) => println!("per-leaf axis: {:?}", args.index_tree(0)),
        Err(err) => println!("error: {}", err),
    }
    match concretize_axes(&spec, &Args::new().with(Axis::new("frame"))) {
        Ok(_) => println!("unexpected success"),
        Err(err) => println!("missing dimension: {}", err),
    }
}
