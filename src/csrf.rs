//! Anti-forgery tokens. The page render mints a token, every mutating request
//! must echo one back. Tokens stay valid until pushed out by newer ones.

use std::{
    collections::{HashSet, VecDeque},
    sync::Mutex,
};

use rand::{distributions::Alphanumeric, Rng};

pub const HEADER: &str = "x-csrf-token";

const TOKEN_LEN: usize = 32;
const DEFAULT_CAPACITY: usize = 256;

pub struct CsrfTokens {
    inner: Mutex<Issued>,
    capacity: usize,
}

#[derive(Default)]
struct Issued {
    order: VecDeque<String>,
    live: HashSet<String>,
}

impl CsrfTokens {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Issued::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn mint(&self) -> String {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LEN)
            .map(char::from)
            .collect();
        let mut issued = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        while issued.order.len() >= self.capacity {
            if let Some(old) = issued.order.pop_front() {
                issued.live.remove(&old);
            }
        }
        issued.order.push_back(token.clone());
        issued.live.insert(token.clone());
        token
    }

    pub fn verify(&self, token: Option<&str>) -> bool {
        match token {
            Some(t) if !t.is_empty() => self
                .inner
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .live
                .contains(t),
            _ => false,
        }
    }
}

impl Default for CsrfTokens {
    fn default() -> Self {
        Self::new()
    }
}
