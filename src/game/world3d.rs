use crate::gui::canvas::{Canvas3d, Color, Cube};
use crate::gui::widget::{UpdateCx, Widget};
use crate::gui::Node;

/// Node that owns no 2D visual and draws a rotating cube in the 3D pass.
#[derive(Debug, Clone)]
pub struct SpinningCube {
    angle: f32,
    speed: f32,
    color: Color,
}

impl SpinningCube {
    pub fn new(color: Color) -> Self {
        Self {
            angle: 0.0,
            speed: 0.9,
            color,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn cube(&self) -> Cube {
        Cube {
            center: [0.0, 0.0, 6.0],
            size: 2.0,
            rotation: [self.angle * 0.6, self.angle, 0.0],
            color: self.color,
        }
    }
}

impl Widget for SpinningCube {
    fn update(&mut self, cx: &mut UpdateCx<'_>) {
        self.angle = (self.angle + cx.timing.delta_seconds * self.speed) % std::f32::consts::TAU;
    }

    fn render_3d(&self, _node: &Node, canvas: &mut dyn Canvas3d) {
        canvas.draw_cube(self.cube());
    }
}
