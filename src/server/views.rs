//! HTML rendering for every page of the site.
//!
//! Each named view is a function from its view-model to an HTML string.
//! Interpolated values always go through [`escape`].

use std::fmt::Write;

use uuid::Uuid;

use super::session::Session;
use crate::models::{Category, Record, Recipe};

pub const TITLE_PREFIX: &str = "Cookie Blog - ";

/// Per-page context every view receives.
#[derive(Debug, Clone)]
pub struct Page {
  pub title: &'static str,
  pub logged_in: bool,
}

impl Page {
  pub fn new(title: &'static str, session: &Session) -> Self {
    Self {
      title,
      logged_in: session.is_authenticated(),
    }
  }

  pub fn anonymous(title: &'static str) -> Self {
    Self {
      title,
      logged_in: false,
    }
  }
}

/// One-shot messages popped for this render.
#[derive(Debug, Clone, Default)]
pub struct Flashes {
  pub info: Vec<String>,
  pub errors: Vec<String>,
}

/// Homepage sections.
#[derive(Debug, Default)]
pub struct Food {
  pub latest: Vec<Record<Recipe>>,
  pub thai: Vec<Record<Recipe>>,
  pub american: Vec<Record<Recipe>>,
  pub chinese: Vec<Record<Recipe>>,
}

pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

fn layout(page: &Page, body: &str) -> String {
  let account = if page.logged_in {
    r#"<a href="/submit-recipe">Submit Recipe</a> <a href="/logout">Logout</a>"#
  } else {
    r#"<a href="/login">Login</a> <a href="/register">Register</a>"#
  };
  format!(
    r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{prefix}{title}</title>
</head>
<body>
  <header>
    <nav>
      <a href="/">Home</a>
      <a href="/categories">Categories</a>
      <a href="/explore-latest">Latest</a>
      <a href="/explore-random">Random</a>
      <a href="/about">About</a>
      <a href="/contact">Contact</a>
      {account}
    </nav>
    <form method="POST" action="/search">
      <input type="search" name="searchTerm" placeholder="Search recipes">
      <button type="submit">Search</button>
    </form>
  </header>
  <main>
{body}
  </main>
</body>
</html>
"#,
    prefix = TITLE_PREFIX,
    title = escape(page.title),
  )
}

fn recipe_href(id: Uuid) -> String {
  format!("/recipe/{}", id)
}

fn upload_src(image: &str) -> String {
  format!("/uploads/{}", urlencoding::encode(image))
}

fn recipe_cards(recipes: &[Record<Recipe>]) -> String {
  if recipes.is_empty() {
    return "<p>No recipes yet</p>".to_string();
  }
  let mut out = String::from(r#"<div class="recipes">"#);
  for recipe in recipes {
    let _ = write!(
      out,
      r#"<a class="recipe-card" href="{href}"><img src="{src}" alt="{name}" loading="lazy"><h3>{name}</h3></a>"#,
      href = recipe_href(recipe.id),
      src = upload_src(&recipe.image),
      name = escape(&recipe.name),
    );
  }
  out.push_str("</div>");
  out
}

fn category_cards(categories: &[Record<Category>]) -> String {
  let mut out = String::from(r#"<div class="categories">"#);
  for category in categories {
    let _ = write!(
      out,
      r#"<a class="category-card" href="/categories/{slug}"><img src="/img/{img}" alt="{name}" loading="lazy"><span>{name}</span></a>"#,
      slug = urlencoding::encode(&category.name),
      img = urlencoding::encode(&category.image),
      name = escape(&category.name),
    );
  }
  out.push_str("</div>");
  out
}

fn flash_block(flashes: &Flashes) -> String {
  let mut out = String::new();
  for message in &flashes.info {
    let _ = write!(out, r#"<div class="alert alert-success">{}</div>"#, escape(message));
  }
  for message in &flashes.errors {
    let _ = write!(out, r#"<div class="alert alert-danger">{}</div>"#, escape(message));
  }
  out
}

fn error_block(error: Option<&str>) -> String {
  error
    .map(|e| format!(r#"<div class="alert alert-danger">{}</div>"#, escape(e)))
    .unwrap_or_default()
}

pub fn index(page: &Page, categories: &[Record<Category>], food: &Food) -> String {
  let body = format!(
    r#"<section><h1>Huge selection of delicious recipe ideas</h1>
<h2>Categories</h2>{categories}<a href="/categories">View more</a></section>
<section><h2>Latest Recipes</h2>{latest}<a href="/explore-latest">View more</a></section>
<section><h2>Thai Recipes</h2>{thai}<a href="/categories/Thai">View more</a></section>
<section><h2>American Recipes</h2>{american}<a href="/categories/American">View more</a></section>
<section><h2>Chinese Recipes</h2>{chinese}<a href="/categories/Chinese">View more</a></section>
<section><h2>Publish your recipe for FREE today</h2><a href="/submit-recipe">Submit Recipe</a></section>"#,
    categories = category_cards(categories),
    latest = recipe_cards(&food.latest),
    thai = recipe_cards(&food.thai),
    american = recipe_cards(&food.american),
    chinese = recipe_cards(&food.chinese),
  );
  layout(page, &body)
}

pub fn categories(page: &Page, categories: &[Record<Category>]) -> String {
  let body = format!("<h1>Categories</h1>{}", category_cards(categories));
  layout(page, &body)
}

/// The categories view filtered down to one category's recipes.
pub fn category(page: &Page, name: &str, recipes: &[Record<Recipe>]) -> String {
  let body = format!(
    "<h1>{} Recipes</h1>{}",
    escape(name),
    recipe_cards(recipes)
  );
  layout(page, &body)
}

fn recipe_detail(recipe: &Record<Recipe>, logged_in: bool) -> String {
  let mut ingredients = String::new();
  for item in &recipe.ingredients {
    let _ = write!(ingredients, "<li>{}</li>", escape(item));
  }
  let edit = if logged_in {
    format!(r#"<a href="/edit-recipe/{}">Edit recipe</a>"#, recipe.id)
  } else {
    String::new()
  };
  format!(
    r#"<article class="recipe">
<img src="{src}" alt="{name}">
<h1>{name}</h1>
<p class="category"><a href="/categories/{slug}">{category}</a></p>
<h2>Description</h2>
<p class="description">{description}</p>
<h2>Ingredients</h2>
<ul class="ingredients">{ingredients}</ul>
<p class="submitted-by">{email}</p>
{edit}
</article>"#,
    src = upload_src(&recipe.image),
    name = escape(&recipe.name),
    slug = urlencoding::encode(recipe.category.as_str()),
    category = recipe.category,
    description = escape(&recipe.description),
    email = escape(&recipe.email),
  )
}

pub fn recipe(page: &Page, recipe: &Record<Recipe>) -> String {
  layout(page, &recipe_detail(recipe, page.logged_in))
}

pub fn search(page: &Page, term: &str, recipes: &[Record<Recipe>]) -> String {
  let results = if recipes.is_empty() {
    "<p>No results found.</p>".to_string()
  } else {
    recipe_cards(recipes)
  };
  let body = format!(
    "<h1>Search results for &quot;{}&quot;</h1>{}",
    escape(term),
    results
  );
  layout(page, &body)
}

pub fn explore_latest(page: &Page, recipes: &[Record<Recipe>]) -> String {
  let body = format!("<h1>Explore Latest</h1>{}", recipe_cards(recipes));
  layout(page, &body)
}

pub fn explore_random(page: &Page, recipe: Option<&Record<Recipe>>) -> String {
  let body = match recipe {
    Some(r) => format!(
      r#"<h1>Explore Random</h1>{}<a href="/explore-random">Another one</a>"#,
      recipe_detail(r, page.logged_in)
    ),
    None => "<h1>Explore Random</h1><p>No recipes yet</p>".to_string(),
  };
  layout(page, &body)
}

/// Form values shown in the submit and edit forms.
#[derive(Debug, Clone, Default)]
pub struct RecipeFormView<'a> {
  pub action: String,
  pub heading: &'static str,
  pub name: &'a str,
  pub description: &'a str,
  pub email: &'a str,
  pub ingredients: &'a [String],
  pub category: Option<&'a str>,
  pub image: Option<&'a str>,
}

fn recipe_form(form: &RecipeFormView<'_>, categories: &[Record<Category>], flashes: &Flashes) -> String {
  let mut options = String::from(r#"<option value="">Select Category</option>"#);
  for category in categories {
    let selected = if form.category == Some(category.name.as_str()) {
      " selected"
    } else {
      ""
    };
    let _ = write!(
      options,
      r#"<option value="{name}"{selected}>{name}</option>"#,
      name = escape(&category.name),
    );
  }

  let mut ingredients = String::new();
  let blank = [String::new()];
  let rows: &[String] = if form.ingredients.is_empty() {
    &blank
  } else {
    form.ingredients
  };
  for item in rows {
    let _ = write!(
      ingredients,
      r#"<div class="ingredientDiv"><input type="text" name="ingredients" value="{}"></div>"#,
      escape(item)
    );
  }

  let current_image = form
    .image
    .map(|img| {
      format!(
        r#"<img class="current-image" src="{}" alt="Current image">"#,
        upload_src(img)
      )
    })
    .unwrap_or_default();

  format!(
    r#"<h1>{heading}</h1>
{flashes}
<form action="{action}" method="POST" enctype="multipart/form-data">
  <label>Email <input type="email" name="email" value="{email}"></label>
  <label>Recipe Name <input type="text" name="name" value="{name}"></label>
  <label>Description <textarea name="description" rows="4">{description}</textarea></label>
  <fieldset class="ingredientList"><legend>Ingredients</legend>{ingredients}</fieldset>
  <button type="button" id="addIngredientsBtn">+ Ingredient</button>
  <label>Category <select name="category">{options}</select></label>
  {current_image}
  <label>Image <input type="file" name="image" accept="image/*"></label>
  <button type="submit">{heading}</button>
</form>"#,
    heading = form.heading,
    flashes = flash_block(flashes),
    action = escape(&form.action),
    email = escape(form.email),
    name = escape(form.name),
    description = escape(form.description),
  )
}

pub fn submit_recipe(page: &Page, categories: &[Record<Category>], flashes: &Flashes) -> String {
  let form = RecipeFormView {
    action: "/submit-recipe".into(),
    heading: "Submit Recipe",
    ..RecipeFormView::default()
  };
  layout(page, &recipe_form(&form, categories, flashes))
}

pub fn edit_recipe(
  page: &Page,
  recipe: &Record<Recipe>,
  categories: &[Record<Category>],
  flashes: &Flashes,
) -> String {
  let form = RecipeFormView {
    action: format!("/edit-recipe/{}", recipe.id),
    heading: "Edit Recipe",
    name: &recipe.name,
    description: &recipe.description,
    email: &recipe.email,
    ingredients: &recipe.ingredients,
    category: Some(recipe.category.as_str()),
    image: Some(&recipe.image),
  };
  layout(page, &recipe_form(&form, categories, flashes))
}

pub fn about(page: &Page) -> String {
  layout(
    page,
    "<h1>About</h1><p>Cookie Blog is a place to share the recipes you love. \
     Browse by category, search for a dish, or publish your own.</p>",
  )
}

pub fn register(page: &Page, error: Option<&str>) -> String {
  let body = format!(
    r#"<h1>Register</h1>
{error}
<form action="/register" method="POST">
  <label>Name <input type="text" name="name"></label>
  <label>Email <input type="email" name="email"></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Register</button>
</form>
<p>Already have an account? <a href="/login">Login</a></p>"#,
    error = error_block(error),
  );
  layout(page, &body)
}

pub fn login(page: &Page, error: Option<&str>) -> String {
  let body = format!(
    r#"<h1>Login</h1>
{error}
<form action="/login" method="POST">
  <label>Email <input type="email" name="email"></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Login</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
    error = error_block(error),
  );
  layout(page, &body)
}

pub fn contact(page: &Page, flashes: &Flashes) -> String {
  let body = format!(
    r#"<h1>Contact</h1>
{flashes}
<form action="/contact" method="POST">
  <label>Name <input type="text" name="name"></label>
  <label>Email <input type="email" name="email"></label>
  <label>Subject <input type="text" name="subject"></label>
  <label>Message <textarea name="message" rows="5"></textarea></label>
  <button type="submit">Send</button>
</form>"#,
    flashes = flash_block(flashes),
  );
  layout(page, &body)
}

pub fn not_found(page: &Page, message: &str) -> String {
  let body = format!(
    r#"<h1>404</h1><p>{}</p><a href="/">Back to the homepage</a>"#,
    escape(message)
  );
  layout(page, &body)
}
