//! Pipelines: Lifting a Kernel Over Named Dimensions
//!
//! Run with: cargo run --example pipeline
//! Set RUST_LOG=dimflow_transform=debug to watch the build pass.
//!
//! This example demonstrates:
//! - Writing a kernel for a single pixel
//! - Vectorizing it with ForAll and folding with Reduce
//! - Resolving an Axis by name in Apply
//! - Reading an attributed error

use dimflow_core::{path, Args, Axis, Elementwise, Spec, Tensor, Tree};
use dimflow_transform::{compose, Apply, BoxError, ForAll, Kernel, Reduce};
use tracing_subscriber::EnvFilter;

fn leaf(data: &Tree<Tensor>, path: &[dimflow_core::Key]) -> Result<Tensor, BoxError> {
    data.get(path)?.as_leaf().cloned().ok_or_else(|| "expected a leaf".into())
}

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Pipelines ===\n");

    // -------------------------------------------------------------------------
    // The kernel: one receiver's contribution to one pixel
    // -------------------------------------------------------------------------
    println!("1. Kernel");
    println!("---------");

    let delay_and_weight = Kernel::new("delay_and_weight", |data: &Tree<Tensor>| {
        let signal = leaf(data, &path!["signal"])?;
        let weight = leaf(data, &path!["weight"])?;
        Ok(Tree::leaf(signal.mul(&weight)?))
    });
    println!("kernel: {}\n", delay_and_weight);

    // -------------------------------------------------------------------------
    // Lifting: ForAll over pixels, Reduce over receivers
    // -------------------------------------------------------------------------
    println!("2. Compose and Build");
    println!("--------------------");

    let spec = Spec::map([
        ("signal", Spec::dims(["receiver", "pixel"])),
        ("weight", Spec::dims(["receiver"])),
    ]);
    let beamform = compose!(delay_and_weight, ForAll::new("pixel"), Reduce::sum("receiver")).build(&spec)?;
    println!("{}", beamform);
    println!("input spec:  {}", beamform.input_spec()?);
    println!("output spec: {}\n", beamform.output_spec()?);

    let data = Tree::map([
        ("signal", Tree::leaf(Tensor::arange(vec![3, 4]))),
        ("weight", Tree::leaf(Tensor::vector(vec![1.0, 0.5, 0.25]))),
    ]);
    let image = beamform.call(&data)?;
    println!("image: {}\n", image);

    // -------------------------------------------------------------------------
    // Apply with a named axis
    // -------------------------------------------------------------------------
    println!("3. Apply with an Axis");
    println!("---------------------");

    let identity = Kernel::<Tensor>::identity();
    let sum_receivers = Apply::new("sum", |tree: Tree<Tensor>, args: &Args| {
        let axis = args.index(0).ok_or("axis was not resolved")?;
        Ok(tree.try_map_leaves(|_, t: &Tensor| t.sum_axis(axis))?)
    })
    .with_args(Args::new().with(Axis::new("receiver")));
    let signal_spec = Spec::map([("signal", Spec::dims(["receiver", "pixel"]))]);
    let summed = compose!(identity, sum_receivers).build(&signal_spec)?;
    let signal = Tree::map([("signal", Tree::leaf(Tensor::arange(vec![3, 4])))]);
    println!("summed: {}", summed.call(&signal)?);
    println!("spec:   {}\n", summed.output_spec()?);

    // -------------------------------------------------------------------------
    // Errors point at the failing step
    // -------------------------------------------------------------------------
    println!("4. Attributed Errors");
    println!("--------------------");

    let unbuilt = compose!(Kernel::<Tensor>::identity(), ForAll::new("pixel"));
    if let Err(err) = unbuilt.call(&signal) {
        println!("{}", err);
        println!("\nas JSON:\n{}", err.report().to_json()?);
    }

    println!("\n=== Done ===");
    Ok(())
}
