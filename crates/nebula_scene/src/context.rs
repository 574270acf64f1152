// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene context.
//!
//! [`SceneContext`] owns everything a frame needs: the scene graph, the
//! camera and its controls, the viewport and an optional [`Sequencer`]. The
//! sequencer never touches the camera directly. A subscription copies the
//! camera object's `position` values into a shared slot whenever they change,
//! and the context applies the slot to the camera after each sequencer tick.

use crate::assets::AssetLoader;
use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::config::SceneConfig;
use crate::error::{Result, SceneError};
use crate::font::{layout_text, TextStyle};
use crate::particles::ParticleField;
use crate::scene::{PointsMaterial, Scene, TextMesh};
use crate::viewport::Viewport;
use glam::Vec3;
use nebula_sequencer::{
    ChannelValues, Completion, PlayOptions, PlaybackOutcome, PropertyKey, Sequencer, Subscription,
};
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;

/// Property of the camera object that drives the camera position
pub const CAMERA_PROPERTY: &str = "position";

/// What changed during one [`SceneContext::tick`]
#[derive(Debug, Clone, PartialEq)]
pub struct FrameUpdate {
    /// Seconds since the loop started
    pub elapsed: f32,
    /// Seconds since the previous frame
    pub delta: f32,
    /// Sequence cursor after the tick, if a sequence is attached
    pub sequence_time: Option<f32>,
    /// Camera position after sequence and controls
    pub camera_position: Vec3,
    /// Particle group position
    pub particle_position: Vec3,
    /// Whether the sequence moved the camera this frame
    pub camera_animated: bool,
}

struct CameraBinding {
    slot: Rc<RefCell<Option<ChannelValues>>>,
    subscription: Subscription,
}

/// Scene, camera, viewport and sequencer for one output surface
pub struct SceneContext {
    config: SceneConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    viewport: Viewport,
    sequencer: Option<Sequencer>,
    binding: Option<CameraBinding>,
    completion: Option<Completion>,
    sequence_outcome: Option<PlaybackOutcome>,
    missing: Vec<SceneError>,
}

impl SceneContext {
    /// Build a context without loading any asset
    pub fn new(config: SceneConfig, rng: &mut impl Rng) -> Result<Self> {
        config.validate()?;
        let particles = ParticleField::from_settings(rng, &config.particles);
        let material = PointsMaterial::from_settings(&config.particles);
        let viewport = Viewport::from_settings(&config.viewport);
        let camera = PerspectiveCamera::from_settings(&config.camera, viewport.aspect());
        let controls = OrbitControls::from_settings(&config.camera);

        Ok(Self {
            scene: Scene::new(particles, material),
            camera,
            controls,
            viewport,
            sequencer: None,
            binding: None,
            completion: None,
            sequence_outcome: None,
            missing: Vec::new(),
            config,
        })
    }

    /// Build a context and load its assets
    ///
    /// The sprite, typeface and sequence document load concurrently. A failed
    /// load is logged and recorded in [`SceneContext::missing_assets`]; the
    /// element it belongs to is left out and the rest of the scene is built.
    pub async fn init(config: SceneConfig, loader: &AssetLoader, rng: &mut impl Rng) -> Result<Self> {
        let mut context = Self::new(config, rng)?;

        let sprite_path = context
            .scene
            .particles
            .texture_path(&context.config.particles.texture_dir);
        let text = &context.config.text;
        let sequence = &context.config.sequence;

        let (sprite, typeface, sequencer) = tokio::join!(
            loader.load_texture(&sprite_path),
            async {
                if text.enabled {
                    Some(loader.load_typeface(&text.font).await)
                } else {
                    None
                }
            },
            async {
                match &sequence.document {
                    Some(document) => Some(
                        loader
                            .load_sequencer(document, sequence.sheet.as_deref())
                            .await,
                    ),
                    None => None,
                }
            },
        );

        match sprite {
            Ok(texture) => context.scene.particle_material.alpha_map = Some(texture),
            Err(e) => context.record_missing(e),
        }

        match typeface {
            Some(Ok(face)) => {
                let style = TextStyle::from(&context.config.text);
                let block = layout_text(&face, &context.config.text.content, &style);
                context.scene.text = Some(TextMesh::new(block, &context.config.text));
            }
            Some(Err(e)) => context.record_missing(e),
            None => {}
        }

        match sequencer {
            Some(Ok(sequencer)) => {
                context.attach_sequencer(sequencer);
                if context.config.sequence.autoplay {
                    context.play_sequence()?;
                }
            }
            Some(Err(e)) => context.record_missing(e),
            None => {}
        }

        tracing::info!(
            "Scene ready: {} particles, {} objects, {} missing assets",
            context.scene.particles.len(),
            context.scene.object_count(),
            context.missing.len()
        );
        Ok(context)
    }

    fn record_missing(&mut self, error: SceneError) {
        tracing::warn!("Skipping scene element: {}", error);
        self.missing.push(error);
    }

    /// Attach a sequencer whose camera object drives the camera
    ///
    /// Replaces and returns any previously attached sequencer.
    pub fn attach_sequencer(&mut self, sequencer: Sequencer) -> Option<Sequencer> {
        if let Some(old) = self.binding.take() {
            old.subscription.cancel();
        }

        let key = PropertyKey::new(self.config.sequence.camera_object.clone(), CAMERA_PROPERTY);
        if sequencer.sequence().property(&key).is_none() {
            tracing::warn!("Sequence `{}` does not animate {}", sequencer.sequence().name, key);
        }

        let slot: Rc<RefCell<Option<ChannelValues>>> = Rc::new(RefCell::new(None));
        let handler_slot = Rc::clone(&slot);
        let handler_key = key.clone();
        // Only changed values reach the slot, so a settled sequence leaves the
        // camera to the orbit controls.
        let mut last_applied: Option<ChannelValues> = None;
        let subscription = sequencer.subscribe([key], move |values| {
            let Some(position) = values.get(&handler_key) else {
                return;
            };
            if last_applied.as_ref() != Some(position) {
                last_applied = Some(position.clone());
                *handler_slot.borrow_mut() = Some(position.clone());
            }
        });

        self.binding = Some(CameraBinding { slot, subscription });
        self.completion = None;
        self.sequence_outcome = None;
        self.sequencer.replace(sequencer)
    }

    /// Start the attached sequence with the configured rate and looping
    ///
    /// Returns `false` when no sequence is attached.
    pub fn play_sequence(&mut self) -> Result<bool> {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return Ok(false);
        };
        let mut options = PlayOptions::new().rate(self.config.sequence.rate);
        if self.config.sequence.looping {
            options = options.infinite();
        }
        self.completion = Some(sequencer.play(options)?);
        self.sequence_outcome = None;
        tracing::info!("Playing camera sequence `{}`", sequencer.sequence().name);
        Ok(true)
    }

    /// Advance one frame
    ///
    /// Order: sequencer, camera binding, particle motion, orbit controls.
    pub fn tick(&mut self, elapsed: f32, delta: f32) -> FrameUpdate {
        let sequence_time = self.sequencer.as_mut().map(|sequencer| {
            sequencer.tick(delta);
            sequencer.position()
        });

        let mut camera_animated = false;
        if let Some(values) = self.binding.as_ref().and_then(|b| b.slot.borrow_mut().take()) {
            let position = values.vec3_or(self.camera.position.to_array());
            self.camera.position = Vec3::from_array(position);
            camera_animated = true;
        }

        self.scene.animate(elapsed);
        self.controls.update(&mut self.camera);

        if self.sequence_outcome.is_none() {
            if let Some(outcome) = self.completion.as_mut().and_then(Completion::try_outcome) {
                tracing::info!("Camera sequence ended: {:?}", outcome);
                self.sequence_outcome = Some(outcome);
                self.completion = None;
            }
        }

        FrameUpdate {
            elapsed,
            delta,
            sequence_time,
            camera_position: self.camera.position,
            particle_position: self.scene.particles.position,
            camera_animated,
        }
    }

    /// Apply a new surface size
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f32) {
        self.viewport.resize(width, height, device_pixel_ratio);
        self.camera.set_aspect(self.viewport.aspect());
    }

    /// Assets that failed to load during [`SceneContext::init`]
    pub fn missing_assets(&self) -> &[SceneError] {
        &self.missing
    }

    /// How the last played sequence ended, once it has
    pub fn sequence_outcome(&self) -> Option<PlaybackOutcome> {
        self.sequence_outcome
    }

    /// Configuration the context was built from
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Scene graph
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Mutable scene graph
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Camera
    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    /// Orbit controls
    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Viewport
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Attached sequencer
    pub fn sequencer(&self) -> Option<&Sequencer> {
        self.sequencer.as_ref()
    }

    /// Mutable attached sequencer
    pub fn sequencer_mut(&mut self) -> Option<&mut Sequencer> {
        self.sequencer.as_mut()
    }
}
