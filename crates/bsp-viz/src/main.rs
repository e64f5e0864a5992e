use bsp_draw_order::{BspTree, BuildConfig, FewestSplits, FirstPolygon, Polygon};
use bsp_viz::{generate_layer_scene, LayerId, OrbitCamera, RenderVisitor};
use macroquad::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pivot {
    First,
    FewestSplits,
}

fn build_tree(layers: &[Polygon<LayerId>], pivot: Pivot) -> BspTree<LayerId> {
    let config = BuildConfig::default().with_plane_epsilon(1e-4);
    let tree = match pivot {
        Pivot::First => BspTree::build(layers.to_vec(), &FirstPolygon, &config),
        Pivot::FewestSplits => BspTree::build(layers.to_vec(), &FewestSplits::default(), &config),
    };

    let stats = tree.stats();
    log::info!(
        "{pivot:?}: {} layers -> {} polygons ({} splits), depth {}",
        stats.input_polygons,
        tree.polygon_count(),
        stats.splits,
        stats.depth
    );
    tree
}

fn init_logging() {
    let mut builder = env_logger::Builder::new();
    match std::env::var("RUST_LOG") {
        Ok(filter) => {
            builder.parse_filters(&filter);
        }
        Err(_) => {
            builder.filter_level(log::LevelFilter::Info);
        }
    }
    builder.init();
}

#[macroquad::main("BSP Draw Order")]
async fn main() {
    init_logging();

    let layers = generate_layer_scene();
    let mut pivot = Pivot::First;
    let mut tree = build_tree(&layers, pivot);
    let mut reversed = false;

    let mut camera = OrbitCamera::new(7.0, 0.5, 0.35);

    loop {
        camera.update();

        if is_key_pressed(KeyCode::S) {
            pivot = match pivot {
                Pivot::First => Pivot::FewestSplits,
                Pivot::FewestSplits => Pivot::First,
            };
            tree = build_tree(&layers, pivot);
        }
        if is_key_pressed(KeyCode::R) {
            reversed = !reversed;
        }

        clear_background(Color::from_rgba(20, 20, 30, 255));
        set_camera(&camera.to_camera3d());

        let mut visitor = RenderVisitor::default();
        let eye = camera.eye_point();
        let _ = if reversed {
            tree.traverse_front_to_back(eye, &mut visitor)
        } else {
            tree.traverse_back_to_front(eye, &mut visitor)
        };

        set_default_camera();

        draw_text(
            &format!(
                "{} layers -> {} polygons, {} splits, depth {}",
                layers.len(),
                tree.polygon_count(),
                tree.stats().splits,
                tree.depth()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Pivot: {pivot:?} [S] | Order: {} [R] | drawn {}",
                if reversed { "near-to-far (wrong)" } else { "far-to-near" },
                visitor.drawn
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );
        draw_text("Drag mouse to rotate, scroll to zoom", 10.0, 65.0, 16.0, DARKGRAY);
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 85.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
