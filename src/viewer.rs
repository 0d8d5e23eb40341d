use std::error::Error;

use image::RgbImage;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::pipeline::{Direction, Parameter, TerrainPipeline};
use crate::render::{pack_rgb, RenderMode};
use crate::viewport::{TexCoordRect, ZoomDirection};

/// Keyboard bindings for the stepped parameter controls
const CONTROLS: [(Key, Parameter, Direction); 16] = [
    (Key::Q, Parameter::SeaLevel, Direction::Increase),
    (Key::A, Parameter::SeaLevel, Direction::Decrease),
    (Key::W, Parameter::Scale, Direction::Increase),
    (Key::S, Parameter::Scale, Direction::Decrease),
    (Key::E, Parameter::Persistence, Direction::Increase),
    (Key::D, Parameter::Persistence, Direction::Decrease),
    (Key::R, Parameter::Lacunarity, Direction::Increase),
    (Key::F, Parameter::Lacunarity, Direction::Decrease),
    (Key::T, Parameter::Octaves, Direction::Increase),
    (Key::G, Parameter::Octaves, Direction::Decrease),
    (Key::Y, Parameter::LightAngle, Direction::Increase),
    (Key::H, Parameter::LightAngle, Direction::Decrease),
    (Key::U, Parameter::LightIntensity, Direction::Increase),
    (Key::J, Parameter::LightIntensity, Direction::Decrease),
    (Key::I, Parameter::Ambient, Direction::Increase),
    (Key::K, Parameter::Ambient, Direction::Decrease),
];

/// Render mode keys, in `RenderMode::all()` order
const MODE_KEYS: [Key; 3] = [Key::Key1, Key::Key2, Key::Key3];

/// Run the interactive terrain viewer until the window closes or Escape is pressed.
pub fn run_viewer(mut pipeline: TerrainPipeline) -> Result<(), Box<dyn Error>> {
    let (mut window_width, mut window_height) = {
        let vp = pipeline.viewport();
        (vp.window_width, vp.window_height)
    };

    let mut window = Window::new(
        "Terrain Generator",
        window_width,
        window_height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )?;
    window.set_target_fps(60);

    pipeline.regenerate()?;
    let mut rect = pipeline.view_rect()?;
    let mut buffer = compose(&pipeline, &rect, window_width, window_height);
    window.set_title(&title(&pipeline));

    print_controls();

    let mut last_mouse_pos: Option<(f32, f32)> = None;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let mut frame_changed = false;
        let mut view_changed = false;

        // Window resize rebuilds the texture
        let (w, h) = window.get_size();
        if (w, h) != (window_width, window_height) && w > 0 && h > 0 {
            match pipeline.resize(w, h) {
                Ok(_) => {
                    window_width = w;
                    window_height = h;
                    frame_changed = true;
                }
                Err(e) => log::warn!("Resize to {}x{} rejected: {}", w, h, e),
            }
        }

        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            match pipeline.regenerate() {
                Ok(_) => frame_changed = true,
                Err(e) => log::warn!("Regenerate failed: {}", e),
            }
        }

        for (key, parameter, direction) in CONTROLS {
            if window.is_key_pressed(key, KeyRepeat::Yes) {
                match pipeline.adjust(parameter, direction) {
                    Ok(_) => {
                        let value = parameter.value(pipeline.settings());
                        println!("{}: {}", parameter.label(), parameter.format_value(value));
                        frame_changed = true;
                    }
                    Err(e) => log::warn!("{} not changed: {}", parameter.label(), e),
                }
            }
        }

        let new_mode = MODE_KEYS
            .iter()
            .zip(RenderMode::all())
            .find(|(key, _)| window.is_key_pressed(**key, KeyRepeat::No))
            .map(|(_, mode)| *mode);
        if let Some(mode) = new_mode {
            if mode != pipeline.settings().render_mode {
                match pipeline.set_render_mode(mode) {
                    Ok(_) => {
                        println!("View: {}", mode.label());
                        frame_changed = true;
                    }
                    Err(e) => log::warn!("Render mode not changed: {}", e),
                }
            }
        }

        // Zoom with the mouse wheel or +/-
        let mut zoom = None;
        if let Some((_, scroll_y)) = window.get_scroll_wheel() {
            if scroll_y > 0.0 {
                zoom = Some(ZoomDirection::In);
            } else if scroll_y < 0.0 {
                zoom = Some(ZoomDirection::Out);
            }
        }
        if window.is_key_pressed(Key::Equal, KeyRepeat::Yes) {
            zoom = Some(ZoomDirection::In);
        } else if window.is_key_pressed(Key::Minus, KeyRepeat::Yes) {
            zoom = Some(ZoomDirection::Out);
        }
        if let Some(direction) = zoom {
            pipeline.zoom(direction)?;
            view_changed = true;
        }

        // Drag to pan. Window y grows downward, the view's v axis grows upward.
        if window.get_mouse_down(MouseButton::Left) {
            if let Some((mx, my)) = window.get_mouse_pos(MouseMode::Clamp) {
                if let Some((last_x, last_y)) = last_mouse_pos {
                    let dx = (mx - last_x) as f64;
                    let dy = (last_y - my) as f64;
                    if dx != 0.0 || dy != 0.0 {
                        pipeline.pan(dx, dy)?;
                        view_changed = true;
                    }
                }
                last_mouse_pos = Some((mx, my));
            }
        } else {
            last_mouse_pos = None;
        }

        if frame_changed || view_changed {
            rect = pipeline.view_rect()?;
            buffer = compose(&pipeline, &rect, window_width, window_height);
        }
        if frame_changed {
            window.set_title(&title(&pipeline));
        }

        window.update_with_buffer(&buffer, window_width, window_height)?;
    }

    Ok(())
}

fn print_controls() {
    println!("Viewer started. Controls:");
    println!("  Mouse wheel / +/-: Zoom");
    println!("  Left drag: Pan");
    for line in control_lines() {
        println!("  {}", line);
    }
    println!("  Space: Regenerate");
    println!("  Esc: Exit");
}

/// One help line per parameter and render mode, taken from the key tables
fn control_lines() -> Vec<String> {
    let key_for = |parameter: Parameter, direction: Direction| {
        CONTROLS
            .iter()
            .find(|(_, p, d)| *p == parameter && *d == direction)
            .map(|(key, _, _)| format!("{:?}", key))
            .unwrap_or_else(|| "-".to_string())
    };

    let mut lines: Vec<String> = Parameter::all()
        .iter()
        .map(|&parameter| {
            format!(
                "{}/{}: {}",
                key_for(parameter, Direction::Increase),
                key_for(parameter, Direction::Decrease),
                parameter.label()
            )
        })
        .collect();
    lines.extend(
        MODE_KEYS
            .iter()
            .zip(RenderMode::all())
            .enumerate()
            .map(|(i, (_, mode))| format!("{}: {}", i + 1, mode.label())),
    );
    lines
}

fn title(pipeline: &TerrainPipeline) -> String {
    let s = pipeline.settings();
    format!(
        "Terrain Generator - {} | sea {:.2} scale {:.4} oct {} pers {:.2} lac {:.2} | light {:.0}° {:.2}/{:.2}",
        s.render_mode.label(),
        s.sea_level,
        s.noise.scale,
        s.noise.octaves,
        s.noise.persistence,
        s.noise.lacunarity,
        s.light.angle_degrees,
        s.light.intensity,
        s.light.ambient,
    )
}

fn compose(pipeline: &TerrainPipeline, rect: &TexCoordRect, out_width: usize, out_height: usize) -> Vec<u32> {
    match pipeline.frame() {
        Some(frame) => sample_view(&frame.pixels, rect, out_width, out_height),
        None => vec![0; out_width * out_height],
    }
}

/// Nearest-neighbour crop of `image` to `rect`, scaled to the output size.
///
/// Texture row 0 sits at v = 0, which is the bottom of the window.
pub fn sample_view(image: &RgbImage, rect: &TexCoordRect, out_width: usize, out_height: usize) -> Vec<u32> {
    let tex_width = image.width() as usize;
    let tex_height = image.height() as usize;
    let mut buffer = vec![0u32; out_width * out_height];
    if tex_width == 0 || tex_height == 0 {
        return buffer;
    }

    let columns: Vec<u32> = (0..out_width)
        .map(|sx| {
            let u = rect.u_min + (sx as f64 + 0.5) / out_width as f64 * rect.width();
            ((u * tex_width as f64).floor() as usize).min(tex_width - 1) as u32
        })
        .collect();

    for (sy, row) in buffer.chunks_exact_mut(out_width.max(1)).enumerate() {
        let v = rect.v_max - (sy as f64 + 0.5) / out_height as f64 * rect.height();
        let ty = ((v * tex_height as f64).floor() as usize).min(tex_height - 1) as u32;
        for (out, &tx) in row.iter_mut().zip(&columns) {
            *out = pack_rgb(image.get_pixel(tx, ty));
        }
    }

    buffer
}
