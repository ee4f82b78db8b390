//! Editing yearly estimations with debounced saves per category.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use engine::{
    MoneyCents, TransactionType,
    estimations::{EstimationBoard, EstimationChange},
};
use tracing::{debug, warn};

use crate::{ClientError, Result, api::ApiClient, autosave::Debouncer};

pub const ESTIMATION_DEBOUNCE: Duration = Duration::from_millis(250);

pub struct EstimationEditor {
    api: ApiClient,
    board: Arc<Mutex<EstimationBoard>>,
    debouncer: Debouncer<String>,
}

fn poisoned() -> ClientError {
    ClientError::Storage("estimation board lock poisoned".to_string())
}

impl EstimationEditor {
    /// Loads categories (with their stored estimations) and transactions and
    /// builds the board for `year`.
    pub async fn load(api: ApiClient, year: i32) -> Result<Self> {
        let categories = api.categories_with_estimations().await?;
        let transactions = api.transactions().await?;
        let board = EstimationBoard::new(&categories, &transactions, year);
        Ok(Self {
            api,
            board: Arc::new(Mutex::new(board)),
            debouncer: Debouncer::new(ESTIMATION_DEBOUNCE),
        })
    }

    /// Copy of the current board.
    pub fn board(&self) -> Result<EstimationBoard> {
        self.board.lock().map(|b| b.clone()).map_err(|_| poisoned())
    }

    /// Updates one value and schedules its save.
    pub fn set(&self, category_id: &str, kind: TransactionType, value: MoneyCents) -> Result<()> {
        self.board
            .lock()
            .map_err(|_| poisoned())?
            .set(category_id, kind, value)?;

        let api = self.api.clone();
        let board = Arc::clone(&self.board);
        let id = category_id.to_string();
        self.debouncer.schedule(id.clone(), move || async move {
            let change = board.lock().ok().and_then(|b| b.pending_change(&id));
            let Some(change) = change else {
                return;
            };
            match api.update_estimations(&change).await {
                Ok(()) => mark_saved(&board, &change),
                Err(err) => warn!(category = %id, %err, "estimation save failed"),
            }
        });
        Ok(())
    }

    /// Saves `category_id` immediately. Returns `false` when nothing
    /// changed since the last save.
    pub async fn save_now(&self, category_id: &str) -> Result<bool> {
        self.debouncer.cancel(&category_id.to_string());
        let change = self
            .board
            .lock()
            .map_err(|_| poisoned())?
            .pending_change(category_id);
        let Some(change) = change else {
            debug!(category = %category_id, "estimation unchanged, not saved");
            return Ok(false);
        };
        self.api.update_estimations(&change).await?;
        mark_saved(&self.board, &change);
        Ok(true)
    }

    /// Saves every changed category; returns how many were sent.
    pub async fn save_all(&self) -> Result<usize> {
        let ids: Vec<String> = self
            .board()?
            .expense
            .iter()
            .map(|line| line.category_id.clone())
            .collect();
        let mut saved = 0;
        for id in ids {
            if self.save_now(&id).await? {
                saved += 1;
            }
        }
        Ok(saved)
    }
}

fn mark_saved(board: &Mutex<EstimationBoard>, change: &EstimationChange) {
    if let Ok(mut board) = board.lock() {
        board.mark_saved(change);
    }
}
