//! Demo driver: feeds text and touch through the full Anima stack and
//! prints the resulting emotional/animation state each step.

use anima_core::{AnimaConfig, Emotion, FrameLoop};
use anima_emotion::{
    ExpressionMemory, ExpressionVariant, IntensityModulator, TransitionEngine, TransitionEvent,
};
use anima_motion::{EyeTracker, MicroExpressionGenerator, PhysicsChain, PhysicsWorld, SpringConfig};
use anima_scene::{build_scene, SceneAnimator, TimeOfDay, Weather};
use anima_sense::{analyze_text, ContextEngine};
use anima_touch::{TouchEngine, TouchPoint};
use chrono::Timelike;
use clap::Parser;
use std::io::BufRead;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to an optional TOML config
    #[arg(short, long, default_value = "anima.toml")]
    config: String,

    /// Read lines from stdin instead of the canned script
    #[arg(short, long)]
    interactive: bool,

    /// Frames to simulate between inputs
    #[arg(long, default_value_t = 30)]
    frames: u32,
}

struct Stack {
    context: ContextEngine,
    transition: FrameLoop<TransitionEngine>,
    micro: FrameLoop<MicroExpressionGenerator>,
    eye: FrameLoop<EyeTracker>,
    physics: FrameLoop<PhysicsWorld>,
    touch: FrameLoop<TouchEngine>,
    intensity: IntensityModulator,
    memory: ExpressionMemory,
    lighting: SceneAnimator,
    weather: Weather,
}

fn seed_variants(memory: &mut ExpressionMemory) {
    memory.register_variants(
        Emotion::Happy,
        vec![
            ExpressionVariant::new("happy_soft_smile"),
            ExpressionVariant::new("happy_grin"),
            ExpressionVariant::with_weight("happy_beam", 0.6),
        ],
    );
    memory.register_variants(
        Emotion::Sad,
        vec![
            ExpressionVariant::new("sad_downcast"),
            ExpressionVariant::new("sad_teary"),
        ],
    );
    memory.register_variants(
        Emotion::Excited,
        vec![
            ExpressionVariant::new("excited_sparkle"),
            ExpressionVariant::new("excited_bounce"),
        ],
    );
}

impl Stack {
    async fn build(config: &AnimaConfig) -> Self {
        let interval = config.frame.interval();

        let mut transition_engine = TransitionEngine::new(config.transition.clone());
        transition_engine.on_transition(|event| {
            if let TransitionEvent::Completed { emotion, intensity } = event {
                info!("transition settled: {} ({:.2})", emotion, intensity);
            }
        });

        let physics = FrameLoop::new(PhysicsWorld::new(config.physics.clone()), interval);
        physics
            .with_mut(|world| {
                world.add_chain(PhysicsChain::strand("hair_l", 5, SpringConfig::default()));
                world.add_chain(PhysicsChain::strand("hair_r", 5, SpringConfig::default()));
            })
            .await;

        let hour = chrono::Local::now().hour();
        let scene = build_scene(Emotion::Neutral, TimeOfDay::from_hour(hour), Weather::Clear);

        let mut memory = ExpressionMemory::new();
        seed_variants(&mut memory);

        Self {
            context: ContextEngine::new(config.context.clone()),
            transition: FrameLoop::new(transition_engine, interval),
            micro: FrameLoop::new(MicroExpressionGenerator::new(config.micro.clone()), interval),
            eye: FrameLoop::new(EyeTracker::new(config.eye.clone()), interval),
            physics,
            touch: FrameLoop::new(TouchEngine::new(config.touch.clone()), interval),
            intensity: IntensityModulator::new(config.intensity.clone()),
            memory,
            lighting: SceneAnimator::new(scene),
            weather: Weather::Clear,
        }
    }

    fn start(&mut self) {
        self.transition.start();
        self.micro.start();
        self.eye.start();
        self.physics.start();
        self.touch.start();
    }

    async fn stop(&mut self) {
        self.transition.stop();
        self.micro.stop();
        self.eye.stop();
        self.physics.stop();
        self.touch.stop();
    }

    async fn handle_text(&mut self, text: &str, frames: u32) {
        let now = Instant::now();
        let signal = analyze_text(text);
        let resolved = self
            .context
            .process_text(text, signal.emotion, signal.intensity, now);

        let hour = chrono::Local::now().hour();
        let gain = self
            .intensity
            .modulate(resolved.intensity, resolved.emotion, hour, now);

        let previous = self.transition.with(|t| t.current_state().emotion).await;
        self.memory.record_transition(previous, resolved.emotion);
        if let Some(variant) = self.memory.select_variant(resolved.emotion) {
            info!("expression variant: {}", variant);
        }

        self.transition
            .with_mut(|t| t.set_emotion(resolved.emotion, gain, now))
            .await;
        self.micro
            .with_mut(|m| {
                m.set_emotion(resolved.emotion);
                m.analyze_and_react(text, now);
            })
            .await;
        self.eye.with_mut(|e| e.set_emotion(resolved.emotion)).await;

        let scene = build_scene(
            resolved.emotion,
            TimeOfDay::from_hour(hour),
            self.weather,
        );
        self.lighting.set_scene(scene);

        info!(
            "「{}」 -> {} ({:.2}) intent={:?} atmosphere={:?}",
            text, resolved.emotion, gain, resolved.intent, resolved.atmosphere
        );
        self.settle(frames).await;
    }

    async fn handle_touch(&mut self, area: &str, frames: u32) {
        let now = Instant::now();
        self.touch
            .with_mut(|t| t.press(area, TouchPoint::new(0.0, 0.0), now))
            .await;
        let outcome = self
            .touch
            .with_mut(|t| t.release(now + Duration::from_millis(60)))
            .await;

        if let Some(outcome) = outcome {
            if let Some(dialogue) = &outcome.dialogue {
                info!("touch {} -> {}: {}", area, outcome.emotion, dialogue);
            }
            let at = Instant::now();
            self.transition
                .with_mut(|t| t.set_emotion(outcome.emotion, 0.8, at))
                .await;
            self.micro.with_mut(|m| m.set_emotion(outcome.emotion)).await;
            info!("affection now {:.1}", outcome.affection);
        } else {
            info!("touch {} -> (suppressed)", area);
        }
        self.settle(frames).await;
    }

    /// Let the frame loops run, then print a state summary.
    async fn settle(&mut self, frames: u32) {
        let interval = Duration::from_millis(16);
        tokio::time::sleep(interval * frames).await;

        let now = Instant::now();
        self.lighting.update(now);

        let blended = self.transition.with(|t| t.blended_state(now)).await;
        let mut params = self.micro.with(|m| m.params()).await;
        params.merge(&self.eye.with(|e| e.params()).await);
        params.merge(&self.physics.with(|w| w.to_params()).await);

        let summary: Vec<String> = params
            .iter()
            .filter(|(name, _)| !name.starts_with("phys_"))
            .map(|(name, v)| format!("{}={:.2}", name, v))
            .collect();

        match blended.secondary {
            Some(secondary) => info!(
                "display: {} {:.0}% + {} {:.0}% | {}",
                blended.primary,
                blended.primary_weight * 100.0,
                secondary,
                blended.secondary_weight * 100.0,
                self.lighting.filter()
            ),
            None => info!(
                "display: {} | {}",
                blended.primary,
                self.lighting.filter()
            ),
        }
        info!("params: {}", summary.join(" "));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = AnimaConfig::load_or_default(&args.config);
    info!("starting Anima demo stack");

    let mut stack = Stack::build(&config).await;
    stack.start();

    if args.interactive {
        info!("interactive mode: type text, or `touch <area>`, or `quit`");
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "quit" || line == "exit" {
                break;
            }
            if let Some(area) = line.strip_prefix("touch ") {
                stack.handle_touch(area.trim(), args.frames).await;
            } else {
                stack.handle_text(line, args.frames).await;
            }
        }
    } else {
        // Canned session exercising every subsystem.
        stack.handle_text("你好呀！", args.frames).await;
        stack.handle_text("我今天升职了，超级开心！！", args.frames).await;
        stack.handle_touch("head", args.frames).await;
        stack.handle_touch("head", args.frames).await;
        stack.handle_text("不过其实……我有点累了。", args.frames).await;
        stack.handle_text("嗯，好的。", args.frames).await;
        stack.handle_touch("hand", args.frames).await;
        stack.handle_text("晚安啦。", args.frames).await;
    }

    stack.stop().await;
    info!("demo finished");
    Ok(())
}
