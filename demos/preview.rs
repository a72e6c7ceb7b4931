//! Render a map with `tiled_raster` and show it in a window.
//!
//! Keys: 0-9 show a single layer, A shows all visible layers.
//! Clicking a cell re-renders just that cell of the top layer.

use std::collections::HashSet;

use macroquad::prelude::*;
use tiled_raster::{Map, Renderer, TilePoint};

fn window_conf() -> Conf {
    Conf {
        window_title: "tiled_raster preview".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn upload(renderer: &Renderer<'_>) -> Texture2D {
    let img = renderer.result();
    let tex = Texture2D::from_rgba8(img.width() as u16, img.height() as u16, img.as_raw());
    tex.set_filter(FilterMode::Nearest);
    tex
}

#[macroquad::main(window_conf)]
async fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "assets/map.json".to_owned());
    let map = Map::load(&path).expect("Failed to load map");
    let mut renderer = Renderer::new(&map).expect("Unsupported map");
    renderer.render_visible_layers().expect("Failed to render map");
    let mut tex = upload(&renderer);
    let mut showing = String::from("all visible layers");

    loop {
        clear_background(BLACK);

        let mut dirty = false;
        if is_key_pressed(KeyCode::A) {
            renderer.clear();
            renderer.render_visible_layers().expect("Failed to render map");
            showing = String::from("all visible layers");
            dirty = true;
        }
        for (key, index) in [
            (KeyCode::Key0, 0),
            (KeyCode::Key1, 1),
            (KeyCode::Key2, 2),
            (KeyCode::Key3, 3),
            (KeyCode::Key4, 4),
            (KeyCode::Key5, 5),
            (KeyCode::Key6, 6),
            (KeyCode::Key7, 7),
            (KeyCode::Key8, 8),
            (KeyCode::Key9, 9),
        ] {
            if is_key_pressed(key) && index < map.layers.len() {
                renderer.clear();
                renderer.render_layer(index).expect("Failed to render layer");
                showing = format!("layer {index}: {}", map.layers[index].name);
                dirty = true;
            }
        }
        if is_mouse_button_pressed(MouseButton::Left) && !map.layers.is_empty() {
            let (mx, my) = mouse_position();
            let point = TilePoint::new(
                (mx / map.tile_width as f32) as i64,
                (my / map.tile_height as f32) as i64,
            );
            renderer.render_layer_tiles(map.layers.len() - 1, &HashSet::from([point]));
            dirty = true;
        }
        if dirty {
            tex = upload(&renderer);
        }

        draw_texture(&tex, 0.0, 0.0, WHITE);
        draw_text(&showing, 20.0, screen_height() - 20.0, 28.0, YELLOW);
        draw_text(
            &format!("FPS: {}", get_fps()),
            screen_width() - 135.0,
            55.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
