// src/ws.rs

use actix::{Actor, ActorContext, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::warn;
use serde::Serialize;

use crate::api::AppState;
use crate::error::Result;
use crate::models::{OhlcvRecord, PredictionResult};

/// Streams candles in and predictions out: every text frame is one record,
/// answered after the predictor has ingested it and retrained.
pub struct PredictorWebSocket {
    state: web::Data<AppState>,
}

#[derive(Debug, Serialize)]
pub struct StepReply {
    /// Loss of the final training epoch, if training ran
    pub loss: Option<f64>,
    pub prediction: Option<PredictionResult>,
}

#[derive(Serialize)]
struct ErrorReply {
    error: String,
}

impl PredictorWebSocket {
    pub fn new(state: web::Data<AppState>) -> Self {
        PredictorWebSocket { state }
    }

    fn step(&self, text: &str) -> Result<StepReply> {
        let record: OhlcvRecord = serde_json::from_str(text)?;
        let step = self.state.lock().ingest(record)?;
        Ok(StepReply {
            loss: step.final_loss(),
            prediction: step.prediction,
        })
    }
}

impl Actor for PredictorWebSocket {
    type Context = ws::WebsocketContext<Self>;
}

// Handle WebSocket messages
impl StreamHandler<std::result::Result<ws::Message, ws::ProtocolError>> for PredictorWebSocket {
    fn handle(
        &mut self,
        msg: std::result::Result<ws::Message, ws::ProtocolError>,
        ctx: &mut Self::Context,
    ) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => {
                let reply = match self.step(&text) {
                    Ok(reply) => serde_json::to_string(&reply),
                    Err(e) => {
                        warn!("Rejected websocket frame: {}", e);
                        serde_json::to_string(&ErrorReply {
                            error: e.to_string(),
                        })
                    }
                };
                match reply {
                    Ok(body) => ctx.text(body),
                    Err(e) => warn!("Failed to encode websocket reply: {}", e),
                }
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => (),
        }
    }
}

// The WebSocket route handler
pub async fn predictor_ws(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> std::result::Result<HttpResponse, Error> {
    ws::start(PredictorWebSocket::new(state), &req, stream)
}
