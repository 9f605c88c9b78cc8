use std::sync::Arc;

use tracing::{info, warn};

use leavesync_core::constants::STATUS_CHANGE_EVENT_COMMENT;
use leavesync_core::time::now;
use leavesync_core::types::LeaveStatus;
use leavesync_core::SyncError;
use leavesync_crypto::{CallbackKey, CryptoError};
use leavesync_store::merger::apply_approval;

use crate::engine::SyncEngine;
use crate::xml::{extract_field, parse_approval_info};

/// Credentials bound into the crypto codec — callback processing is
/// entirely inert (GET returns 4xx, POST drains nothing) until these are
/// configured.
pub struct CallbackCredentials {
    pub token: String,
    pub key: CallbackKey,
    pub recipient_id: String,
}

pub struct CallbackHandler {
    engine: Arc<SyncEngine>,
    credentials: Option<CallbackCredentials>,
}

impl CallbackHandler {
    pub fn new(engine: Arc<SyncEngine>, credentials: Option<CallbackCredentials>) -> Self {
        Self { engine, credentials }
    }

    pub fn configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// `GET /callback` — verifies and decrypts `echostr`, returning the
    /// plaintext to echo back. Any failure is a single opaque error; the
    /// HTTP layer maps it to a 4xx without detail (§4.9).
    pub fn verify_url(
        &self,
        msg_signature: &str,
        timestamp: &str,
        nonce: &str,
        echostr: &str,
    ) -> Result<String, CryptoError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(CryptoError::SignatureMismatch)?;

        if !leavesync_crypto::verify(msg_signature, &creds.token, timestamp, nonce, echostr) {
            return Err(CryptoError::SignatureMismatch);
        }
        leavesync_crypto::decrypt(echostr, &creds.key, &creds.recipient_id)
    }

    /// `POST /callback` — always returns the literal string `success`
    /// regardless of outcome (P6), after attempting to verify, decrypt,
    /// parse and dispatch the event.
    pub async fn handle_event(
        &self,
        msg_signature: &str,
        timestamp: &str,
        nonce: &str,
        body_xml: &str,
    ) -> &'static str {
        if let Err(e) = self.process_event(msg_signature, timestamp, nonce, body_xml).await {
            warn!(error = %e, "callback event dropped");
        }
        "success"
    }

    async fn process_event(
        &self,
        msg_signature: &str,
        timestamp: &str,
        nonce: &str,
        body_xml: &str,
    ) -> Result<(), SyncError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or_else(|| SyncError::CryptoError("callback not configured".into()))?;

        let encrypt = extract_field(body_xml, "Encrypt")
            .ok_or_else(|| SyncError::CryptoError("missing <Encrypt> in callback body".into()))?;

        if !leavesync_crypto::verify(msg_signature, &creds.token, timestamp, nonce, &encrypt) {
            return Err(SyncError::CryptoError("signature mismatch".into()));
        }
        let plaintext = leavesync_crypto::decrypt(&encrypt, &creds.key, &creds.recipient_id)?;

        let event = parse_approval_info(&plaintext)
            .ok_or_else(|| SyncError::TransformError {
                sp_no: String::new(),
                reason: "could not parse ApprovalInfo".into(),
            })?;

        if let Some(name) = &event.sp_name {
            if name != leavesync_core::constants::RECORD_TYPE_LEAVE {
                return Ok(());
            }
        }
        if event.status_change_event == Some(STATUS_CHANGE_EVENT_COMMENT) {
            return Ok(());
        }
        if event.sp_status == Some(1) {
            let index = self.engine.active_index_store.load()?;
            if index.approvals.contains_key(&event.sp_no) {
                return Ok(());
            }
        }

        let status = event.sp_status.unwrap_or(0);
        if self.engine.lock.acquire() {
            let result = dispatch(&self.engine, &event.sp_no, status).await;
            self.engine.lock.release();
            result
        } else {
            self.engine
                .callback_queue
                .lock()
                .await
                .push((event.sp_no, status));
            Ok(())
        }
    }

    /// Queue-drain timer body: runs every 2 seconds, started iff callback
    /// credentials are configured. Dedups pending entries by spNo, keeping
    /// the latest status (P7), dispatching each once the lock is free.
    pub async fn drain_queue(&self) {
        if !self.engine.lock.is_held() {
            let mut queue = self.engine.callback_queue.lock().await;
            if queue.is_empty() {
                return;
            }
            if !self.engine.lock.acquire() {
                return;
            }
            let mut latest: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
            for (sp_no, status) in queue.drain(..) {
                latest.insert(sp_no, status);
            }
            drop(queue);

            for (sp_no, status) in latest {
                if let Err(e) = dispatch(&self.engine, &sp_no, status).await {
                    warn!(sp_no, error = %e, "queued dispatch failed");
                }
            }
            self.engine.lock.release();
        }
    }
}

/// Refetches the approval detail (authoritative over the callback-reported
/// status) and applies the three dispatch rules of §4.9.
async fn dispatch(engine: &SyncEngine, sp_no: &str, reported_status: i64) -> Result<(), SyncError> {
    let detail = engine
        .client
        .approval_detail(sp_no)
        .await
        .map_err(SyncError::from)?;

    let Some(record) = detail else {
        return Ok(()); // unparsable or non-leave detail: nothing to do
    };

    let ts = now();
    let mut index = engine.active_index_store.load()?;
    let mut doc = engine.leave_store.load()?;

    match record.current_status {
        LeaveStatus::Pending => {
            apply_approval(&mut doc, &mut index, &record, ts);
        }
        LeaveStatus::Approved => {
            if let Some(stored) = index.approvals.remove(sp_no) {
                let status_text = LeaveStatus::Approved.as_text().to_string();
                let user_slots = doc.leave_data.entry(stored.userid.clone()).or_default();
                for slot in &stored.leave_dates {
                    user_slots.insert(slot.clone(), status_text.clone());
                }
            } else {
                apply_approval(&mut doc, &mut index, &record, ts);
            }
        }
        _ => {
            if let Some(stored) = index.approvals.remove(sp_no) {
                let status_text = record.current_status.as_text().to_string();
                let user_slots = doc.leave_data.entry(stored.userid.clone()).or_default();
                for slot in &stored.leave_dates {
                    user_slots.insert(slot.clone(), status_text.clone());
                }
            } else if doc.leave_data.contains_key(&record.userid) {
                let status_text = record.current_status.as_text().to_string();
                let user_slots = doc.leave_data.entry(record.userid.clone()).or_default();
                for slot in &record.leave_dates {
                    user_slots.insert(slot.clone(), status_text.clone());
                }
            }
        }
    }

    doc.touch(ts);
    engine.leave_store.save(&doc)?;
    engine.active_index_store.save(&index)?;
    info!(sp_no, reported_status, status = %record.current_status, "callback event dispatched");
    Ok(())
}
