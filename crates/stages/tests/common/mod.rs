//! Shared fakes for the gateway and sequencer integration tests.
//!
//! Time is virtual: `FakeClock` advances its own offset when slept against,
//! so pacing, backoff, and timeout behaviour is observable without real
//! waiting. `StubProvider` plays back a fixed script of outcomes and
//! records every request it sees.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::NaiveDate;
use pipeline::{
    CallError, CancellationToken, CitationStyle, Clock, GenerationRequest, GenerationResponse,
    ModelProvider, RunRequest,
};

// ---------------------------------------------------------------------------
// Virtual time
// ---------------------------------------------------------------------------

pub struct FakeClock {
    start: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        })
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    /// Virtual time elapsed since construction.
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap()
    }
}

#[async_trait]
impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        *self.offset.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

/// One scripted outcome for a provider attempt.
pub enum StubCall {
    Ok(&'static str),
    Err(CallError),
    /// Never resolves; forces the gateway's per-attempt timeout.
    Hang,
}

pub struct StubProvider {
    script: Mutex<VecDeque<StubCall>>,
    requests: Mutex<Vec<GenerationRequest>>,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

impl StubProvider {
    pub fn new(script: Vec<StubCall>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            cancel_after: Mutex::new(None),
        })
    }

    /// Cancels `token` as a side effect of the `nth` attempt (1-based),
    /// for exercising mid-stage cancellation deterministically.
    pub fn cancel_after(&self, nth: usize, token: CancellationToken) {
        *self.cancel_after.lock().unwrap() = Some((nth, token));
    }

    /// Every request the provider has seen, in order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for StubProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, CallError> {
        let seen = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        if let Some((nth, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if seen >= *nth {
                token.cancel();
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(StubCall::Ok(text)) => Ok(GenerationResponse {
                text: text.to_string(),
            }),
            Some(StubCall::Err(error)) => Err(error),
            Some(StubCall::Hang) => std::future::pending().await,
            None => Err(CallError::Transient {
                status: None,
                message: "stub script exhausted".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Request fixture
// ---------------------------------------------------------------------------

pub fn run_request(topic: &str) -> RunRequest {
    RunRequest {
        topic: topic.to_string(),
        subject: "Computer Science".to_string(),
        researcher: "R. Surveyor".to_string(),
        institution: "Institute of Applied Research".to_string(),
        date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        citation_style: CitationStyle::Apa,
    }
}
