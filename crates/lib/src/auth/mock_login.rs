//! Mock login pages: pick a roster user and store their email in the `mockEmail` cookie.
//!
//! Only served in mock mode; in provider mode every route here answers 404.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use super::{AuthGate, AuthMode, MOCK_EMAIL_COOKIE, MOCK_LOGIN_PATH};

#[derive(Debug, Deserialize)]
pub struct MockLoginForm {
    pub email: String,
}

fn escape_html(s: &str) -> String {
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

fn render_login_page(gate: &AuthGate) -> String {
    let mut items = String::new();
    for user in gate.roster().users() {
        let verified = if user.email_verified { "" } else { " (unverified)" };
        items.push_str(&format!(
            "<li><form method=\"post\" action=\"{action}\">\
             <input type=\"hidden\" name=\"email\" value=\"{email}\">\
             <button type=\"submit\">{name}</button> {email}{verified}</form></li>\n",
            action = MOCK_LOGIN_PATH,
            email = escape_html(&user.email),
            name = escape_html(&user.name),
            verified = verified,
        ));
    }
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>Mock login</title></head>\n\
         <body><h1>Sign in as a preview user</h1>\n<ul>\n{}</ul></body></html>\n",
        items
    )
}

fn not_found() -> Response {
    StatusCode::NOT_FOUND.into_response()
}

/// GET /mock-login — list the roster.
pub async fn mock_login_page(State(gate): State<AuthGate>) -> Response {
    if gate.mode() != AuthMode::Mock {
        return not_found();
    }
    Html(render_login_page(&gate)).into_response()
}

/// POST /mock-login — set the cookie for a roster email and go home.
pub async fn mock_login_submit(
    State(gate): State<AuthGate>,
    Form(form): Form<MockLoginForm>,
) -> Response {
    if gate.mode() != AuthMode::Mock {
        return not_found();
    }
    let email = form.email.trim();
    if gate.roster().find(email).is_none() {
        log::debug!("mock login rejected unknown email {}", email);
        return Redirect::to(MOCK_LOGIN_PATH).into_response();
    }
    log::info!("mock login as {}", email);
    let cookie = format!(
        "{}={}; Path=/; SameSite=Lax; HttpOnly",
        MOCK_EMAIL_COOKIE,
        urlencoding::encode(email)
    );
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

/// GET /mock-logout — clear the cookie.
pub async fn mock_logout(State(gate): State<AuthGate>) -> Response {
    if gate.mode() != AuthMode::Mock {
        return not_found();
    }
    let cookie = format!("{}=; Path=/; Max-Age=0; SameSite=Lax; HttpOnly", MOCK_EMAIL_COOKIE);
    ([(header::SET_COOKIE, cookie)], Redirect::to(MOCK_LOGIN_PATH)).into_response()
}
