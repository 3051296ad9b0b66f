use axum::{
  extract::{multipart::MultipartError, Multipart, Path, State},
  response::{Html, Response},
  Form,
};
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;

use super::{redirect, save_failure, take_flashes};
use crate::models::{Recipe, RecipeCategory, RecipeDraft, Record, SaveError};
use crate::server::error::AppError;
use crate::server::session::{self, FlashKind, Session};
use crate::server::state::AppState;
use crate::server::upload::UploadedFile;
use crate::server::validation::{FormFields, RECIPE_RULES};
use crate::server::views::{self, Food, Page};
use crate::types::{Filter, Query};

const HOME_LIMIT: usize = 5;
const PAGE_LIMIT: usize = 20;
const RECIPE_NOT_FOUND: &str = "Recipe not found.";

pub async fn homepage(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let categories = state.categories();
  let recipes = state.recipes();
  let in_category = |c: RecipeCategory| Query::eq("category", c.as_str()).limit(HOME_LIMIT);
  let first_categories = Query::all().limit(HOME_LIMIT);
  let newest = Query::all().newest_first().limit(HOME_LIMIT);
  let (thai_query, american_query, chinese_query) = (
    in_category(RecipeCategory::Thai),
    in_category(RecipeCategory::American),
    in_category(RecipeCategory::Chinese),
  );

  let (categories, latest, thai, american, chinese) = tokio::try_join!(
    categories.find(&first_categories),
    recipes.find(&newest),
    recipes.find(&thai_query),
    recipes.find(&american_query),
    recipes.find(&chinese_query),
  )?;

  let food = Food {
    latest,
    thai,
    american,
    chinese,
  };
  Ok(Html(views::index(
    &Page::new("Home", &session),
    &categories,
    &food,
  )))
}

pub async fn explore_categories(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let categories = state
    .categories()
    .find(&Query::all().limit(PAGE_LIMIT))
    .await?;
  Ok(Html(views::categories(
    &Page::new("Categories", &session),
    &categories,
  )))
}

/// Recipes whose category matches the path segment exactly. Unknown
/// categories simply list nothing.
pub async fn explore_category(
  State(state): State<AppState>,
  session: Session,
  Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
  let recipes = state
    .recipes()
    .find(&Query::eq("category", &name).limit(PAGE_LIMIT))
    .await?;
  Ok(Html(views::category(
    &Page::new("Categories", &session),
    &name,
    &recipes,
  )))
}

pub async fn explore_recipe(
  State(state): State<AppState>,
  session: Session,
  Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
  let recipe = find_recipe(&state, &id).await?;
  Ok(Html(views::recipe(&Page::new("Recipe", &session), &recipe)))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchForm {
  #[serde(rename = "searchTerm", default)]
  search_term: String,
}

pub async fn search_recipe(
  State(state): State<AppState>,
  session: Session,
  Form(form): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
  let recipes = state
    .recipes()
    .find(&Query::text(form.search_term.as_str()))
    .await?;
  tracing::debug!(term = %form.search_term, hits = recipes.len(), "Recipe search");
  Ok(Html(views::search(
    &Page::new("Search", &session),
    &form.search_term,
    &recipes,
  )))
}

pub async fn explore_latest(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let recipes = state
    .recipes()
    .find(&Query::all().newest_first().limit(PAGE_LIMIT))
    .await?;
  Ok(Html(views::explore_latest(
    &Page::new("Explore Latest", &session),
    &recipes,
  )))
}

/// Count, pick a uniform offset, fetch the one record there. A recipe that
/// disappears in between renders the empty state.
pub async fn explore_random(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let recipes = state.recipes();
  let count = recipes.count(&Filter::All).await?;
  let recipe = if count == 0 {
    None
  } else {
    let offset = rand::thread_rng().gen_range(0..count) as usize;
    recipes.find_one(&Query::all().skip(offset)).await?
  };
  Ok(Html(views::explore_random(
    &Page::new("Explore Random", &session),
    recipe.as_ref(),
  )))
}

pub async fn submit_recipe_page(
  State(state): State<AppState>,
  session: Session,
) -> Result<Html<String>, AppError> {
  let flashes = take_flashes(&state, &session, FlashKind::Submit).await?;
  let categories = state.categories().find(&Query::all()).await?;
  Ok(Html(views::submit_recipe(
    &Page::new("Submit Recipe", &session),
    &categories,
    &flashes,
  )))
}

pub async fn submit_recipe(
  State(state): State<AppState>,
  session: Session,
  multipart: Multipart,
) -> Result<Response, AppError> {
  let mut form = RecipeForm::read(multipart).await?;
  RECIPE_RULES.apply(&mut form)?;

  let (kind, messages) = match save_recipe(&state, form, None).await {
    Ok(saved) => {
      tracing::info!(id = %saved.id, name = %saved.name, "Recipe added");
      (FlashKind::Submit, vec!["Recipe had been added.".to_string()])
    }
    Err(messages) => (FlashKind::Errors, messages),
  };
  let cookie = session::flash(&state, &session, kind, &messages).await?;
  Ok(redirect("/submit-recipe", cookie))
}

pub async fn edit_recipe_page(
  State(state): State<AppState>,
  session: Session,
  Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
  let recipe = find_recipe(&state, &id).await?;
  let flashes = take_flashes(&state, &session, FlashKind::Submit).await?;
  let categories = state.categories().find(&Query::all()).await?;
  Ok(Html(views::edit_recipe(
    &Page::new("Edit Recipe", &session),
    &recipe,
    &categories,
    &flashes,
  )))
}

/// Overwrites every field from the form, mirroring submit.
pub async fn edit_recipe(
  State(state): State<AppState>,
  session: Session,
  Path(id): Path<String>,
  multipart: Multipart,
) -> Result<Response, AppError> {
  let mut form = RecipeForm::read(multipart).await?;
  RECIPE_RULES.apply(&mut form)?;
  let existing = find_recipe(&state, &id).await?;

  let (kind, messages) = match save_recipe(&state, form, Some(&existing)).await {
    Ok(saved) => {
      tracing::info!(id = %saved.id, "Recipe updated");
      (FlashKind::Submit, vec!["Recipe has been updated.".to_string()])
    }
    Err(messages) => (FlashKind::Errors, messages),
  };
  let cookie = session::flash(&state, &session, kind, &messages).await?;
  Ok(redirect(&format!("/edit-recipe/{}", existing.id), cookie))
}

/// Absent and malformed ids both answer 404.
async fn find_recipe(state: &AppState, id: &str) -> Result<Record<Recipe>, AppError> {
  let Ok(id) = id.parse::<Uuid>() else {
    return Err(AppError::NotFound(RECIPE_NOT_FOUND));
  };
  state
    .recipes()
    .find_by_id(id)
    .await?
    .ok_or(AppError::NotFound(RECIPE_NOT_FOUND))
}

/// Store this request's upload and create or overwrite the recipe. Every
/// field, the image included, comes from the form. Failures come back as the
/// lines to flash.
async fn save_recipe(
  state: &AppState,
  mut form: RecipeForm,
  existing: Option<&Record<Recipe>>,
) -> Result<Record<Recipe>, Vec<String>> {
  let upload = form.image.take();
  let stored_name = match &upload {
    Some(file) => Some(
      state
        .uploads
        .stored_name(file)
        .map_err(|e| vec![format!("image: {}", e)])?,
    ),
    None => None,
  };
  let recipe = form
    .into_draft(stored_name.clone())
    .into_recipe()
    .map_err(|e| save_failure(SaveError::Schema(e)))?;

  if let (Some(file), Some(name)) = (&upload, &stored_name) {
    state.uploads.write(name, &file.bytes).await.map_err(|e| {
      tracing::error!("Failed to store upload {}: {}", name, e);
      vec!["image: the upload could not be stored.".to_string()]
    })?;
  }

  let recipes = state.recipes();
  match existing {
    None => recipes.create(recipe).await.map_err(save_failure),
    Some(current) => match recipes.replace(current.id, recipe).await {
      Ok(Some(saved)) => Ok(saved),
      Ok(None) => Err(vec![RECIPE_NOT_FOUND.to_string()]),
      Err(e) => Err(save_failure(e)),
    },
  }
}

/// The multipart recipe form. `None` marks a field that was not sent.
#[derive(Debug, Default)]
pub struct RecipeForm {
  name: Option<String>,
  description: Option<String>,
  email: Option<String>,
  ingredients: Vec<String>,
  category: Option<String>,
  image: Option<UploadedFile>,
}

impl RecipeForm {
  async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
    let mut form = Self::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
      let Some(name) = field.name().map(str::to_string) else {
        continue;
      };
      if name == "image" {
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_multipart)?;
        // browsers send an empty part when no file was picked
        if !file_name.is_empty() && !bytes.is_empty() {
          form.image = Some(UploadedFile { file_name, bytes });
        }
        continue;
      }

      let text = field.text().await.map_err(bad_multipart)?;
      match name.as_str() {
        "name" => form.name = Some(text),
        "description" => form.description = Some(text),
        "email" => form.email = Some(text),
        "category" => form.category = Some(text),
        "ingredients" | "ingredients[]" => form.ingredients.push(text),
        _ => {}
      }
    }
    Ok(form)
  }

  fn into_draft(self, image: Option<String>) -> RecipeDraft {
    RecipeDraft {
      name: self.name.unwrap_or_default(),
      description: self.description.unwrap_or_default(),
      email: self.email.unwrap_or_default(),
      ingredients: self.ingredients,
      category: self.category.unwrap_or_default(),
      image,
    }
  }
}

impl FormFields for RecipeForm {
  fn field(&self, name: &str) -> Option<&str> {
    match name {
      "name" => self.name.as_deref(),
      "description" => self.description.as_deref(),
      "email" => self.email.as_deref(),
      "category" => self.category.as_deref(),
      _ => None,
    }
  }

  fn field_mut(&mut self, name: &str) -> Option<&mut String> {
    match name {
      "name" => self.name.as_mut(),
      "description" => self.description.as_mut(),
      "email" => self.email.as_mut(),
      "category" => self.category.as_mut(),
      _ => None,
    }
  }
}

fn bad_multipart(e: MultipartError) -> AppError {
  AppError::BadRequest(e.body_text())
}
