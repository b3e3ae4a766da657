use std::path::{Path, PathBuf};

use anyhow::Context;
use bsp_compiler::{BspAsset, Plane};
use bsp_viz::{OrbitCamera, TreeNavigator};
use clap::Parser;
use env_logger::Env;
use log::{error, info};
use macroquad::prelude::*;

#[derive(Parser)]
#[command(name = "bsp-viz", about = "Explore a compiled BSP asset")]
struct Cli {
    /// Asset file produced by obj2bsp
    asset: PathBuf,
}

fn load(path: &Path) -> anyhow::Result<(BspAsset, Vec<Plane>)> {
    let asset =
        BspAsset::read(path).with_context(|| format!("failed to load {}", path.display()))?;
    let planes = asset
        .planes()
        .with_context(|| format!("invalid face in {}", path.display()))?;
    Ok((asset, planes))
}

#[macroquad::main("BSP Asset Viewer")]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (asset, planes) = match load(&cli.asset) {
        Ok(loaded) => loaded,
        Err(err) => {
            error!("{err:#}");
            return;
        }
    };
    info!(
        "loaded {}: {} vertices, {} faces, {} nodes, depth {}",
        cli.asset.display(),
        asset.vertices.len(),
        asset.faces.len(),
        asset.bsp.len(),
        asset.bsp.depth()
    );

    let mut camera = OrbitCamera::framing(&asset.vertices);
    let mut navigator = TreeNavigator::new();
    let axis = camera.max_distance() / 20.0;

    loop {
        camera.update();
        navigator.update(&asset.bsp);

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        let drawn = navigator.render(&asset, &planes, camera.eye_point());

        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(axis, 0.0, 0.0), RED);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, axis, 0.0), GREEN);
        draw_line_3d(vec3(0.0, 0.0, 0.0), vec3(0.0, 0.0, axis), BLUE);

        set_default_camera();

        draw_text(
            &format!(
                "{} - {} faces, {} nodes",
                cli.asset.display(),
                asset.faces.len(),
                asset.bsp.len()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!("Tree depth: {} | Drawn: {}", asset.bsp.depth(), drawn),
            10.0,
            45.0,
            18.0,
            GRAY,
        );

        navigator.draw_ui(&asset.bsp, 70.0);

        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 155.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 175.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
