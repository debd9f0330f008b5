use crate::transform::{Point, Size, Transform};

/// Screen positions of the background dots currently on screen.
///
/// Dots sit on world-space multiples of `spacing`, so they move with the
/// content when panning or zooming. When `spacing * scale` drops below
/// `min_pixel_spacing` nothing is generated at all.
///
/// # Arguments
/// * `canvas_size` - Canvas size in screen units
/// * `transform` - Current pan offset and zoom
/// * `spacing` - World-space distance between dots
/// * `min_pixel_spacing` - Smallest on-screen spacing still worth drawing
pub fn grid_dots(
    canvas_size: Size,
    transform: &Transform,
    spacing: f32,
    min_pixel_spacing: f32,
) -> Vec<Point> {
    if spacing <= 0.0 || spacing * transform.scale < min_pixel_spacing {
        return Vec::new();
    }

    let visible = transform.visible_world_rect(canvas_size);
    let (first_col, last_col) = index_range(visible.min_x(), visible.max_x(), spacing);
    let (first_row, last_row) = index_range(visible.min_y(), visible.max_y(), spacing);
    let span = |first: i64, last: i64| last.saturating_sub(first).saturating_add(1).max(0) as usize;
    let cols = span(first_col, last_col);
    let rows = span(first_row, last_row);

    let count = cols.saturating_mul(rows);
    if count > MAX_GRID_DOTS {
        log::debug!("grid of {} dots skipped", count);
        return Vec::new();
    }

    let mut dots = Vec::with_capacity(count);
    for row in first_row..=last_row {
        let y = row as f32 * spacing;
        for col in first_col..=last_col {
            let x = col as f32 * spacing;
            dots.push(transform.world_to_screen(Point::new(x, y)));
        }
    }
    dots
}

/// Upper bound on generated dots; denser grids are not drawn.
pub const MAX_GRID_DOTS: usize = 250_000;

/// Indices of the spacing multiples within `[min, max]`. Empty when the
/// range is inverted or not finite.
fn index_range(min: f32, max: f32, spacing: f32) -> (i64, i64) {
    let first = (min / spacing).ceil();
    let last = (max / spacing).floor();
    if !first.is_finite() || !last.is_finite() {
        return (0, -1);
    }
    (first as i64, last as i64)
}

/// Generate SVG path commands for the dot grid
///
/// Each dot is a closed circle made of two arcs, so a single Slint `Path`
/// with a fill can draw the whole grid.
///
/// # Returns
/// SVG path commands string (e.g., "M 23 24 A 1 1 0 1 0 25 24 A 1 1 0 1 0 23 24 Z ...")
pub fn generate_grid_commands(
    canvas_size: Size,
    transform: &Transform,
    spacing: f32,
    min_pixel_spacing: f32,
    dot_radius: f32,
) -> String {
    let dots = grid_dots(canvas_size, transform, spacing, min_pixel_spacing);
    let mut commands = String::with_capacity(dots.len() * 48);

    for dot in dots {
        if !commands.is_empty() {
            commands.push(' ');
        }
        let left = dot.x - dot_radius;
        let right = dot.x + dot_radius;
        commands.push_str(&format!(
            "M {} {} A {r} {r} 0 1 0 {} {} A {r} {r} 0 1 0 {} {} Z",
            left,
            dot.y,
            right,
            dot.y,
            left,
            dot.y,
            r = dot_radius
        ));
    }

    commands
}
