use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use rs_predict_core::model::formatter::Prediction;
use rs_predict_core::model::ngram_model::{build_model, NGramModel};
use rs_predict_core::model::random::{RandomSource, ThreadRandom};
use rs_predict_core::model::sampler::sample_and_append;
use rs_predict_core::model::session::{GenerationSession, SessionConfig, Step};

/// Command-line configuration of the server.
#[derive(Parser, Debug)]
#[command(name = "rs-predict-server")]
#[command(about = "HTTP front end for the n-gram next-token predictor")]
struct Args {
	/// Address to bind
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to bind
	#[arg(short, long, default_value_t = 5000)]
	port: u16,

	/// Extra corpus file (one sentence per line) added to the built-in corpus
	#[arg(short, long)]
	corpus: Option<PathBuf>,

	/// Temperature used by the shared session
	#[arg(short, long, default_value_t = 1.0)]
	temperature: f64,

	/// Top-k used by the shared session
	#[arg(short = 'k', long, default_value_t = 5)]
	top_k: usize,

	/// Delay between two auto-generation steps, in milliseconds
	#[arg(long, default_value_t = 800)]
	step_delay_ms: u64,
}

/// Query parameters for the `/v1/predict` endpoint
#[derive(Deserialize)]
struct PredictParams {
	prompt: Option<String>,
	temperature: Option<f64>,
	top_k: Option<usize>,
}

/// Body of the `/v1/sample` endpoint
#[derive(Deserialize)]
struct SampleBody {
	prompt: String,
	predictions: Vec<Prediction>,
}

/// Response of the `/v1/sample` endpoint
#[derive(Serialize, Debug, PartialEq)]
struct Sampled {
	token: String,
	end_of_sequence: bool,
	prompt: String,
}

/// `None` when there is nothing to suggest.
fn sample<R: RandomSource>(body: SampleBody, random: &mut R) -> Option<Sampled> {
	let SampleBody { mut prompt, predictions } = body;
	let (token, end_of_sequence) = sample_and_append(&mut prompt, &predictions, random)?;
	Some(Sampled { token, end_of_sequence, prompt })
}

#[derive(Deserialize)]
struct PromptQuery {
	text: Option<String>,
}

struct SharedData {
	model: Arc<NGramModel>,
	session: GenerationSession<ThreadRandom>,
	/// A driver task is sleeping before its next tick.
	driver_pending: bool,
}

type Shared = web::Data<Mutex<SharedData>>;

/// HTTP GET endpoint `/v1/predict`
///
/// Stateless prediction over `prompt`. Missing parameters fall back to an
/// empty prompt, temperature 1.0 and top-5.
#[get("/v1/predict")]
async fn get_predict(data: Shared, query: web::Query<PredictParams>) -> impl Responder {
	let prompt = query.prompt.as_deref().unwrap_or("");
	let temperature = query.temperature.unwrap_or(1.0);
	let top_k = query.top_k.unwrap_or(5);

	let model = match data.lock() {
		Ok(shared) => shared.model.clone(),
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().json(model.predict(prompt, temperature, top_k))
}

/// HTTP POST endpoint `/v1/sample`
///
/// Samples one token from the posted prediction list and returns it with
/// the extended prompt, or `null` for an empty list.
#[post("/v1/sample")]
async fn post_sample(body: web::Json<SampleBody>) -> impl Responder {
	HttpResponse::Ok().json(sample(body.into_inner(), &mut ThreadRandom))
}

#[get("/v1/model")]
async fn get_model(data: Shared) -> impl Responder {
	match data.lock() {
		Ok(shared) => HttpResponse::Ok().json(shared.model.summary()),
		Err(_) => HttpResponse::InternalServerError().body("Model lock failed"),
	}
}

#[get("/v1/session")]
async fn get_session(data: Shared) -> impl Responder {
	match data.lock() {
		Ok(shared) => HttpResponse::Ok().json(shared.session.snapshot()),
		Err(_) => HttpResponse::InternalServerError().body("Session lock failed"),
	}
}

/// Replaces the session prompt, as typing in the prompt box would.
#[put("/v1/session/prompt")]
async fn put_prompt(data: Shared, query: web::Query<PromptQuery>) -> impl Responder {
	let mut shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	shared.session.set_prompt(query.text.as_deref().unwrap_or(""));
	HttpResponse::Ok().json(shared.session.snapshot())
}

#[put("/v1/session/predict")]
async fn put_predict(data: Shared) -> impl Responder {
	let mut shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	shared.session.predict();
	HttpResponse::Ok().json(shared.session.snapshot())
}

/// Runs one append step and, if the session asks for it, starts the
/// driver task that keeps auto-generating.
#[put("/v1/session/append")]
async fn put_append(data: Shared) -> impl Responder {
	let (step, spawn_driver) = {
		let mut shared = match data.lock() {
			Ok(m) => m,
			Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
		};
		let step = shared.session.append();
		let spawn_driver = step.next_in.is_some() && !shared.driver_pending;
		if spawn_driver {
			shared.driver_pending = true;
		}
		(step, spawn_driver)
	};

	if let Some(delay) = step.next_in.filter(|_| spawn_driver) {
		actix_web::rt::spawn(drive(data.into_inner(), delay));
	}
	HttpResponse::Ok().json(step)
}

#[put("/v1/session/clear")]
async fn put_clear(data: Shared) -> impl Responder {
	let mut shared = match data.lock() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Session lock failed"),
	};
	shared.session.clear();
	HttpResponse::Ok().json(shared.session.snapshot())
}

/// Cooperative auto-generation loop.
///
/// Sleeps, ticks, and repeats while the session schedules a follow-up.
/// Cancellation happens inside the session: a tick after `clear` or a
/// manual predict returns without a delay and the loop ends.
async fn drive(data: Arc<Mutex<SharedData>>, mut delay: Duration) {
	loop {
		actix_web::rt::time::sleep(delay).await;

		let step: Step = match data.lock() {
			Ok(mut shared) => {
				let step = shared.session.tick();
				if step.next_in.is_none() {
					shared.driver_pending = false;
				}
				step
			}
			Err(_) => {
				warn!("Session lock poisoned, stopping auto-generation");
				return;
			}
		};
		debug!("Auto-generation step: {:?}", step.event);

		match step.next_in {
			Some(next) => delay = next,
			None => return,
		}
	}
}

/// Main entry point for the server.
///
/// Builds the model (plus an optional extra corpus), wraps the shared
/// session in a `Mutex` and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let model = match &args.corpus {
		Some(path) => NGramModel::from_file(path)
			.map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
		None => build_model(),
	};
	let model = Arc::new(model);
	info!("Model ready: {:?}", model.summary());

	let config = SessionConfig {
		temperature: args.temperature,
		top_k: args.top_k,
		step_delay: Duration::from_millis(args.step_delay_ms),
		..SessionConfig::default()
	};
	let shared_data = SharedData {
		model: model.clone(),
		session: GenerationSession::new(model, ThreadRandom, config),
		driver_pending: false,
	};
	let shared_data = web::Data::new(Mutex::new(shared_data));

	info!("Listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.service(get_predict)
			.service(post_sample)
			.service(get_model)
			.service(get_session)
			.service(put_prompt)
			.service(put_predict)
			.service(put_append)
			.service(put_clear)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;

	fn body(prompt: &str, predictions: Vec<Prediction>) -> SampleBody {
		SampleBody { prompt: prompt.to_owned(), predictions }
	}

	#[test]
	fn empty_prediction_list_samples_nothing() {
		assert_eq!(sample(body("the cat", Vec::new()), &mut ThreadRandom), None);
	}

	#[test]
	fn sampled_token_extends_the_prompt() {
		let predictions = vec![Prediction { token: "sat".to_owned(), probability: 1.0 }];
		let sampled = sample(body("the cat", predictions), &mut ThreadRandom);
		assert_eq!(
			sampled,
			Some(Sampled { token: "sat".to_owned(), end_of_sequence: false, prompt: "the cat sat".to_owned() })
		);
	}
}
