use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use rs_predict_core::model::ngram_model::LazyModel;
use rs_predict_core::model::session::{GenerationSession, SessionConfig, StepEvent};

#[derive(Parser, Debug)]
#[command(name = "rs-predict-exemple")]
#[command(about = "Walk-through of the n-gram next-token predictor")]
struct Args {
    /// Prompt to predict from
    #[arg(short, long, default_value = "i like")]
    prompt: String,

    /// Sampling temperature (values below 0.05 are raised to 0.05)
    #[arg(short, long, default_value_t = 1.0)]
    temperature: f64,

    /// Number of candidates to show (clamped to 1..=10)
    #[arg(short = 'k', long, default_value_t = 5)]
    top_k: usize,

    /// Seed for the auto-generation run
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Maximum number of auto-generation steps
    #[arg(long, default_value_t = 40)]
    steps: usize,

    /// Delay between steps in milliseconds (0 runs without pausing)
    #[arg(long, default_value_t = 0)]
    step_delay_ms: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    // The model is built on first access only
    let lazy = LazyModel::new();
    let model = lazy.get();
    info!("Model summary: {:?}", model.summary());

    // Stateless prediction: same prompt, same model, same answer
    println!("Next token after {:?}:", args.prompt);
    for prediction in model.predict(&args.prompt, args.temperature, args.top_k) {
        println!("  {:>8.2}%  {}", prediction.probability * 100.0, prediction.token);
    }

    // A seeded session makes the run reproducible
    let config = SessionConfig {
        temperature: args.temperature,
        top_k: args.top_k,
        step_delay: Duration::from_millis(args.step_delay_ms),
        restart_delay: Duration::ZERO,
        ..SessionConfig::default()
    };
    let mut session = GenerationSession::new(Arc::clone(&model), StdRng::seed_from_u64(args.seed), config);

    // A prediction over the empty prompt enables "append", which then
    // starts auto-generation from a random starter phrase
    session.predict();
    let mut step = session.append();

    for _ in 0..args.steps {
        match &step.event {
            StepEvent::Started { starter } => println!("\n> {starter}"),
            StepEvent::Restarted { starter } => println!("\n(restart) > {starter}"),
            StepEvent::Appended { token, .. } => println!("  + {token:<12} | {}", session.prompt()),
            StepEvent::Disabled | StepEvent::Skipped => break,
        }

        let Some(delay) = step.next_in else {
            break;
        };
        thread::sleep(delay);
        step = session.tick();
    }

    println!("\nFinal prompt: {}", session.prompt());
    Ok(())
}
