//! services/dashboard/src/web/views.rs
//!
//! Server-rendered HTML for the login, register and dashboard pages.
//! Every interpolated value goes through [`escape`].

use dashboard_core::domain::SessionUser;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f9fafb; margin: 0; }
.center { display: flex; min-height: 100vh; align-items: center; justify-content: center; }
.card { background: #fff; padding: 2rem; border-radius: 0.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.15); width: 100%; max-width: 28rem; }
.card label { display: block; margin: 1rem 0 0.25rem; }
.card input { width: 100%; box-sizing: border-box; padding: 0.5rem 0.75rem; border: 1px solid #d1d5db; border-radius: 0.25rem; }
.card button { width: 100%; margin-top: 1.5rem; padding: 0.5rem; background: #000; color: #fff; border: 0; border-radius: 0.25rem; }
.card button:disabled { opacity: 0.5; }
.error { color: #ef4444; font-size: 0.875rem; margin-top: 1rem; }
.success { color: #16a34a; }
.muted { text-align: center; font-size: 0.875rem; margin-top: 0.5rem; }
.dashboard { max-width: 80rem; margin: 0 auto; padding: 1.5rem; }
.header { display: flex; justify-content: space-between; align-items: center; }
.logout { background: #dc2626; color: #fff; font-weight: bold; padding: 0.5rem 1rem; border: 0; border-radius: 0.25rem; }
.info { background: #f3f4f6; border-radius: 0.5rem; padding: 1rem; margin: 1.5rem 0; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(16rem, 1fr)); gap: 1.5rem; }
.cards > div { border-radius: 0.5rem; padding: 1.5rem; }
.blue { background: #eff6ff; } .green { background: #f0fdf4; } .purple { background: #faf5ff; }
"#;

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, head_extra: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{head_extra}
<style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

fn error_block(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(r#"<div class="error" role="alert">{}</div>"#, escape(message)),
        None => String::new(),
    }
}

fn submit_button(loading: bool, idle: &str, busy: &str) -> String {
    if loading {
        format!(r#"<button type="submit" disabled>{}</button>"#, busy)
    } else {
        format!(r#"<button type="submit">{}</button>"#, idle)
    }
}

pub fn login_page(email: &str, error: Option<&str>, loading: bool) -> String {
    let body = format!(
        r#"<div class="center">
<form class="card" method="post" action="/login">
<h1>Login</h1>
<label for="email">Email</label>
<input id="email" name="email" type="email" value="{email}" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
{error}
{button}
<div class="muted">Don&apos;t have an account? <a href="/register">Register</a></div>
</form>
</div>"#,
        email = escape(email),
        error = error_block(error),
        button = submit_button(loading, "Login", "Logging in..."),
    );
    layout("Login", "", &body)
}

pub fn register_page(email: &str, username: &str, error: Option<&str>, loading: bool) -> String {
    let body = format!(
        r#"<div class="center">
<form class="card" method="post" action="/register">
<h1>Register</h1>
<label for="email">Email</label>
<input id="email" name="email" type="email" value="{email}" required>
<label for="username">Username</label>
<input id="username" name="username" type="text" value="{username}" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" required>
{error}
{button}
<div class="muted">Already have an account? <a href="/login">Login</a></div>
</form>
</div>"#,
        email = escape(email),
        username = escape(username),
        error = error_block(error),
        button = submit_button(loading, "Register", "Registering..."),
    );
    layout("Register", "", &body)
}

/// Shown after a successful registration; moves on to the login page after
/// two seconds.
pub fn registration_complete_page() -> String {
    let body = r#"<div class="center">
<div class="card" style="text-align:center">
<h1 class="success">Registration Complete!</h1>
<p>Your account has been created successfully. Redirecting to login page...</p>
</div>
</div>"#;
    layout(
        "Registration Complete",
        r#"<meta http-equiv="refresh" content="2;url=/login">"#,
        body,
    )
}

/// Placeholder that reloads itself until auth state settles.
pub fn loading_page(message: &str) -> String {
    let body = format!(
        r#"<div class="center"><p>{}</p></div>"#,
        escape(message)
    );
    layout("Loading", r#"<meta http-equiv="refresh" content="1">"#, &body)
}

pub fn dashboard_page(user: &SessionUser) -> String {
    let email = user.email.as_deref().unwrap_or("");
    let last_sign_in = user.last_seen_at().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let body = format!(
        r#"<div class="dashboard">
<div class="header">
<h1>Welcome to Your Dashboard</h1>
<form method="post" action="/logout"><button class="logout" type="submit">Logout</button></form>
</div>
<div class="info">
<h2>User Information</h2>
<p><strong>Email:</strong> {email}</p>
<p><strong>User ID:</strong> {id}</p>
<p><strong>Last Sign In:</strong> {last_sign_in}</p>
</div>
<div class="cards">
<div class="blue"><h3>Account Status</h3><p>Your account is active and ready to use.</p></div>
<div class="green"><h3>Authentication</h3><p>Successfully authenticated with Supabase.</p></div>
<div class="purple"><h3>Next Steps</h3><p>Start building your application features here.</p></div>
</div>
</div>"#,
        email = escape(email),
        id = user.id,
        last_sign_in = last_sign_in,
    );
    layout("Dashboard", "", &body)
}
