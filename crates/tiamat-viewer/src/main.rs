//! Demo host for the tiamat engine.
//!
//! Plays the role of the scene-graph side of the contract: it owns the
//! shape entities, writes their transforms every frame, registers and
//! deregisters them, and drives the camera. Everything GPU-side stays
//! behind the engine's `Raymarcher`.

use std::sync::Arc;

use anyhow::Result;

use tiamat_engine::coords::Vec3;
use tiamat_engine::core::{App, AppControl, FrameCtx};
use tiamat_engine::device::GpuInit;
use tiamat_engine::logging::{init_logging, LoggingConfig};
use tiamat_engine::paint::Color;
use tiamat_engine::render::{Camera, Raymarcher};
use tiamat_engine::scene::{
    self, CsgOp, RegistryHandle, RegistryService, Shape, ShapeDesc, ShapeKind, Transform,
};
use tiamat_engine::window::{Runtime, RuntimeConfig};

struct DemoScene {
    /// Kept alive by ownership; the registry only holds weak references.
    _ground: Arc<Shape>,
    body: Arc<Shape>,
    satellite: Arc<Shape>,
    cutter: Arc<Shape>,
    cutter_registered: bool,
}

impl DemoScene {
    fn build() -> Self {
        let ground = Arc::new(Shape::new(
            ShapeKind::Plane,
            ShapeDesc {
                priority: 0,
                dimensions: Vec3::up(),
                blend: 0.8,
                colour: Color::from_srgb_u8(120, 130, 110, 255),
                ..Default::default()
            },
        ));

        let body = Arc::new(Shape::new(
            ShapeKind::Sphere,
            ShapeDesc {
                priority: 10,
                dimensions: Vec3::new(1.4, 0.0, 0.0),
                blend: 1.2,
                colour: Color::from_srgb_u8(200, 80, 70, 255),
                transform: Transform {
                    position: Vec3::new(0.0, 1.4, 0.0),
                    rotation: Vec3::zero(),
                },
                ..Default::default()
            },
        ));

        let satellite = Arc::new(Shape::new(
            ShapeKind::Sphere,
            ShapeDesc {
                priority: 20,
                dimensions: Vec3::new(0.7, 0.0, 0.0),
                blend: 1.6,
                colour: Color::from_srgb_u8(80, 120, 210, 255),
                ..Default::default()
            },
        ));

        let cutter = Arc::new(Shape::new(
            ShapeKind::Cuboid,
            ShapeDesc {
                operation: CsgOp::Subtraction,
                priority: 30,
                dimensions: Vec3::new(0.5, 0.5, 2.4),
                blend: 0.5,
                colour: Color::from_srgb_u8(40, 35, 35, 255),
                transform: Transform {
                    position: Vec3::new(0.0, 1.4, 0.0),
                    rotation: Vec3::zero(),
                },
                ..Default::default()
            },
        ));

        scene::register(&ground);
        scene::register(&body);
        scene::register(&satellite);
        scene::register(&cutter);

        Self {
            _ground: ground,
            body,
            satellite,
            cutter,
            cutter_registered: true,
        }
    }

    /// Host-side per-frame transform writes; the engine only reads these.
    fn animate(&mut self, elapsed: f32) {
        let orbit = elapsed * 0.7;
        self.satellite.set_position(Vec3::new(
            orbit.cos() * 2.6,
            1.4 + (elapsed * 1.3).sin() * 0.5,
            orbit.sin() * 2.6,
        ));

        self.body
            .set_position(Vec3::new(0.0, 1.4 + (elapsed * 0.9).sin() * 0.12, 0.0));

        self.cutter.set_rotation(Vec3::new(0.0, elapsed * 0.4, 0.0));

        // Toggle the cutter every few seconds to exercise the topology
        // path (register/deregister → full rebuild + buffer realloc).
        let want_cutter = (elapsed as u32 / 4) % 2 == 0;
        if want_cutter != self.cutter_registered {
            if want_cutter {
                scene::register(&self.cutter);
            } else {
                scene::deregister(&self.cutter);
            }
            self.cutter_registered = want_cutter;
        }
    }
}

struct Viewer {
    raymarcher: Raymarcher,
    camera: Camera,
    scene: DemoScene,
}

impl Viewer {
    fn new(registry: RegistryHandle, scene: DemoScene) -> Self {
        Self {
            raymarcher: Raymarcher::new(registry),
            camera: Camera::new(Vec3::new(0.0, 2.8, -8.0), 0.18, 0.0),
            scene,
        }
    }
}

impl App for Viewer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        self.scene.animate(ctx.time.elapsed);

        self.raymarcher
            .begin_frame(ctx.gpu.device(), ctx.viewport(), ctx.time);

        let raymarcher = &mut self.raymarcher;
        let camera = &self.camera;
        ctx.render(Color::BLACK, |rctx, target| {
            raymarcher.end_frame(rctx, target, camera);
        })
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let registry = RegistryService::install();
    let scene = DemoScene::build();

    log::info!("starting viewer with {} shapes", registry.len());

    Runtime::run(
        RuntimeConfig {
            title: "tiamat viewer".to_string(),
            ..Default::default()
        },
        GpuInit::default(),
        Viewer::new(registry, scene),
    )
}
