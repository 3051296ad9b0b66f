use axum::{
  extract::State,
  http::StatusCode,
  response::{Html, IntoResponse, Response},
  Form,
};
use serde::Deserialize;

use super::{redirect, save_failure, take_flashes};
use crate::models::Contact;
use crate::server::error::AppError;
use crate::server::session::{self, FlashKind, Session};
use crate::server::state::AppState;
use crate::server::validation::{FormFields, CONTACT_RULES};
use crate::server::views::{self, Page};

pub async fn about(session: Session) -> Html<String> {
  Html(views::about(&Page::new("About", &session)))
}

pub async fn contact_page(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let flashes = take_flashes(&state, &session, FlashKind::Contact).await?;
  Ok(Html(views::contact(&Page::new("Contact", &session), &flashes)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
  name: Option<String>,
  email: Option<String>,
  subject: Option<String>,
  message: Option<String>,
}

impl FormFields for ContactForm {
  fn field(&self, name: &str) -> Option<&str> {
    match name {
      "name" => self.name.as_deref(),
      "email" => self.email.as_deref(),
      "subject" => self.subject.as_deref(),
      "message" => self.message.as_deref(),
      _ => None,
    }
  }

  fn field_mut(&mut self, name: &str) -> Option<&mut String> {
    match name {
      "name" => self.name.as_mut(),
      "email" => self.email.as_mut(),
      "subject" => self.subject.as_mut(),
      "message" => self.message.as_mut(),
      _ => None,
    }
  }
}

pub async fn contact(
  State(state): State<AppState>,
  session: Session,
  Form(mut form): Form<ContactForm>,
) -> Result<Response, AppError> {
  CONTACT_RULES.apply(&mut form)?;

  let message = Contact {
    name: form.name.unwrap_or_default(),
    email: form.email.unwrap_or_default(),
    subject: form.subject.unwrap_or_default(),
    message: form.message.unwrap_or_default(),
  };
  let cookie = match state.contacts().create(message).await {
    Ok(saved) => {
      tracing::info!(id = %saved.id, "Contact message saved");
      session::flash(
        &state,
        &session,
        FlashKind::Contact,
        &["Contact has been added.".to_string()],
      )
      .await?
    }
    Err(e) => session::flash(&state, &session, FlashKind::Errors, &save_failure(e)).await?,
  };
  Ok(redirect("/contact", cookie))
}

/// Anything no route matched.
pub async fn not_found(session: Session) -> Response {
  (
    StatusCode::NOT_FOUND,
    Html(views::not_found(&Page::new("Not Found", &session), "Page not found.")),
  )
    .into_response()
}
