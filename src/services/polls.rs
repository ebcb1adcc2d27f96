//! Poll voting service
//!
//! One vote per (poll, client IP). The check runs before the insert without
//! a stored constraint, so two truly simultaneous votes from the same IP may
//! both land.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::{finish_form, form_errors, push_error};
use crate::errors::{PortalError, Result};
use crate::storage::{OptionTally, PollRecord, PollTally, SeaOrmStorage};

/// Admin form for creating or editing a poll
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PollForm {
    #[validate(length(min = 1, max = 200, message = "Informe o título da enquete."))]
    pub title: String,
    #[validate(length(min = 1, message = "Informe a pergunta."))]
    pub question: String,
    #[serde(default)]
    pub article_id: Option<i64>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// Percentage of `total` with one decimal place; 0.0 when nobody voted
pub fn percentage(votes: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (votes as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Combine a poll with its per-option counts
pub fn build_tally(poll: PollRecord, counts: &HashMap<i64, i64>) -> PollTally {
    let total_votes: i64 = poll
        .options
        .iter()
        .map(|o| counts.get(&o.id).copied().unwrap_or(0))
        .sum();

    let options = poll
        .options
        .into_iter()
        .map(|o| {
            let votes = counts.get(&o.id).copied().unwrap_or(0);
            OptionTally {
                id: o.id,
                text: o.text,
                votes,
                percentage: percentage(votes, total_votes),
            }
        })
        .collect();

    PollTally {
        poll_id: poll.id,
        title: poll.title,
        question: poll.question,
        article_id: poll.article_id,
        total_votes,
        options,
    }
}

pub struct PollService {
    storage: Arc<SeaOrmStorage>,
}

impl PollService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    async fn load(&self, poll_id: i64) -> Result<PollRecord> {
        self.storage
            .find_poll(poll_id)
            .await?
            .ok_or_else(|| PortalError::not_found(format!("Enquete {} não encontrada", poll_id)))
    }

    async fn tally_record(&self, poll: PollRecord) -> Result<PollTally> {
        let counts = self.storage.vote_counts(poll.id).await?;
        Ok(build_tally(poll, &counts))
    }

    pub async fn tally(&self, poll_id: i64) -> Result<PollTally> {
        let poll = self.load(poll_id).await?;
        self.tally_record(poll).await
    }

    pub async fn tally_for_article(&self, article_id: i64) -> Result<Option<PollTally>> {
        match self.storage.find_poll_for_article(article_id).await? {
            Some(poll) => Ok(Some(self.tally_record(poll).await?)),
            None => Ok(None),
        }
    }

    /// Cast a vote and return the updated tally
    pub async fn cast_vote(&self, poll_id: i64, option_id: i64, ip_address: &str) -> Result<PollTally> {
        let poll = self.load(poll_id).await?;

        if !poll.options.iter().any(|o| o.id == option_id) {
            return Err(PortalError::invalid_option(
                "Opção inválida para esta enquete.",
            ));
        }

        if self.storage.has_voted(poll_id, ip_address).await? {
            return Err(PortalError::already_voted("Você já votou nesta enquete."));
        }

        self.storage.insert_vote(option_id, ip_address).await?;
        info!("PollService: vote recorded poll={} option={}", poll_id, option_id);

        self.tally_record(poll).await
    }

    pub async fn list(&self) -> Result<Vec<PollTally>> {
        let polls = self.storage.list_polls().await?;
        let mut tallies = Vec::with_capacity(polls.len());
        for poll in polls {
            tallies.push(self.tally_record(poll).await?);
        }
        Ok(tallies)
    }

    /// Validate the form; returns cleaned option texts
    async fn check_form(&self, form: &PollForm, poll_id: Option<i64>) -> Result<Vec<String>> {
        let mut errors = form_errors(form);

        let mut options: Vec<String> = Vec::new();
        for text in &form.options {
            let text = text.trim();
            if !text.is_empty() && !options.iter().any(|o| o == text) {
                options.push(text.to_string());
            }
        }
        if options.len() < 2 {
            push_error(&mut errors, "options", "Informe ao menos duas opções.");
        }
        if options.iter().any(|o| o.chars().count() > 200) {
            push_error(
                &mut errors,
                "options",
                "Cada opção deve ter no máximo 200 caracteres.",
            );
        }

        if let Some(article_id) = form.article_id {
            if !self.storage.article_exists(article_id).await? {
                push_error(&mut errors, "article_id", "Notícia não encontrada.");
            } else if let Some(existing) = self.storage.find_poll_for_article(article_id).await?
                && Some(existing.id) != poll_id
            {
                push_error(&mut errors, "article_id", "Esta notícia já possui uma enquete.");
            }
        }

        finish_form(errors)?;
        Ok(options)
    }

    pub async fn create(&self, form: PollForm) -> Result<PollTally> {
        let options = self.check_form(&form, None).await?;
        let id = self
            .storage
            .insert_poll(form.title.trim(), form.question.trim(), form.article_id, &options)
            .await?;
        self.tally(id).await
    }

    pub async fn update(&self, poll_id: i64, form: PollForm) -> Result<PollTally> {
        self.load(poll_id).await?;
        let options = self.check_form(&form, Some(poll_id)).await?;
        let updated = self
            .storage
            .update_poll(
                poll_id,
                form.title.trim(),
                form.question.trim(),
                form.article_id,
                &options,
            )
            .await?;
        if !updated {
            return Err(PortalError::not_found(format!("Enquete {} não encontrada", poll_id)));
        }
        self.tally(poll_id).await
    }

    pub async fn delete(&self, poll_id: i64) -> Result<()> {
        if !self.storage.delete_poll(poll_id).await? {
            return Err(PortalError::not_found(format!("Enquete {} não encontrada", poll_id)));
        }
        info!("PollService: poll {} deleted", poll_id);
        Ok(())
    }
}
