//! Reader accounts: registration, login, staff bootstrap

use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidateEmail};

use super::{finish_form, form_errors, push_error};
use crate::errors::{PortalError, Result};
use crate::storage::{SeaOrmStorage, UserAccount};
use crate::utils::password::{MIN_PASSWORD_LEN, hash_password, verify_password};

/// Registration form
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 1, max = 150, message = "Informe seu nome (até 150 caracteres)."))]
    pub name: String,
    #[validate(email(message = "Informe um e-mail válido."))]
    pub email: String,
    #[validate(length(min = 8, message = "A senha deve ter pelo menos 8 caracteres."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "As senhas não coincidem."))]
    pub password_confirm: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub struct AccountService {
    storage: Arc<SeaOrmStorage>,
}

impl AccountService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Register a reader; every field error is reported and nothing is written on failure
    pub async fn register(&self, mut form: RegisterForm) -> Result<UserAccount> {
        form.name = form.name.trim().to_string();
        form.email = normalize_email(&form.email);

        let mut errors = form_errors(&form);
        if !errors.contains_key("email") && self.storage.email_registered(&form.email).await? {
            push_error(&mut errors, "email", "E-mail já registrado.");
        }
        finish_form(errors)?;

        let hash = hash_password(&form.password)?;
        let user = self
            .storage
            .insert_user(&form.name, &form.email, &hash, false)
            .await?;

        info!("AccountService: registered user {}", user.id);
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<UserAccount> {
        let email = normalize_email(email);
        let Some(credentials) = self.storage.find_credentials_by_email(&email).await? else {
            return Err(PortalError::unauthorized("E-mail ou senha inválidos."));
        };

        match verify_password(password, &credentials.password_hash) {
            Ok(true) => Ok(credentials.account),
            Ok(false) => Err(PortalError::unauthorized("E-mail ou senha inválidos.")),
            Err(e) => {
                warn!("Stored hash for user {} is unreadable: {}", credentials.account.id, e);
                Err(PortalError::unauthorized("E-mail ou senha inválidos."))
            }
        }
    }

    /// Create a staff account (CLI bootstrap)
    pub async fn create_staff(&self, name: &str, email: &str, password: &str) -> Result<UserAccount> {
        let email = normalize_email(email);
        let name = name.trim();

        if name.is_empty() {
            return Err(PortalError::invalid_field("name", "Informe o nome."));
        }
        if !email.validate_email() {
            return Err(PortalError::invalid_field("email", "Informe um e-mail válido."));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::invalid_field(
                "password",
                "A senha deve ter pelo menos 8 caracteres.",
            ));
        }
        if self.storage.email_registered(&email).await? {
            return Err(PortalError::invalid_field("email", "E-mail já registrado."));
        }

        let hash = hash_password(password)?;
        let user = self.storage.insert_user(name, &email, &hash, true).await?;
        info!("AccountService: staff account {} created", user.id);
        Ok(user)
    }

    pub async fn find(&self, user_id: i64) -> Result<Option<UserAccount>> {
        self.storage.find_user(user_id).await
    }
}
