/// Example: Load a model and print its mesh statistics and starting matrices
///
/// Usage: cargo run --example mesh_stats -- path/to/model.obj
use std::env;

use meshview_core::{FrameUniforms, MeshBuilder, ModelMotion, ViewerConfig, CUBE_OBJ};

fn main() -> anyhow::Result<()> {
    let config = ViewerConfig::default();
    let builder: MeshBuilder = config.mesh.builder();

    let mesh = match env::args().nth(1) {
        Some(path) => {
            println!("Loading model: {}", path);
            builder.load(&path)?
        }
        None => {
            println!("No model provided, using default cube...");
            builder.build(CUBE_OBJ)?
        }
    };

    println!("Vertices:  {}", mesh.vertex_count());
    println!("Triangles: {}", mesh.triangle_count());
    if let Some(bounds) = mesh.bounds() {
        println!("Bounds:    {:?} .. {:?}", bounds.min.coords.as_slice(), bounds.max.coords.as_slice());
    }
    println!("Center:    {:?}", mesh.center().coords.as_slice());
    println!("Radius:    {:.4}", mesh.radius());

    let camera = config.camera.initial_state();
    let motion = ModelMotion::new(mesh.center(), config.scene.spin_speed);
    let uniforms = FrameUniforms::compose(&camera, 4.0 / 3.0, 0.0, &motion, config.scene.light_position())?;
    for (name, value) in uniforms.iter() {
        println!("{name}: {value:?}");
    }

    Ok(())
}
