use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

pub fn create_static_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/static/css/styles.css", get(serve_styles))
        .route("/static/img/clinic-bg.svg", get(serve_background))
}

async fn serve_styles() -> impl IntoResponse {
    let css = r#"
:root {
    --teal: #0f766e;
    --teal-dark: #115e59;
    --ink: #1f2937;
    --paper: #f8fafc;
    --danger: #b91c1c;
    --success: #15803d;
}

* { box-sizing: border-box; }

body {
    margin: 0;
    font-family: "Segoe UI", Arial, sans-serif;
    color: var(--ink);
    background-color: var(--paper);
    background-size: cover;
    background-attachment: fixed;
    min-height: 100vh;
}

.topnav {
    display: flex;
    justify-content: space-between;
    align-items: center;
    padding: 0.75rem 2rem;
    background: var(--teal);
    color: #fff;
}

.topnav .brand {
    font-size: 1.3rem;
    font-weight: 700;
    letter-spacing: 0.12em;
}

.topnav a {
    color: #fff;
    text-decoration: none;
    margin-left: 1.25rem;
    font-weight: 600;
}

.topnav a:hover { text-decoration: underline; }

main.card {
    max-width: 640px;
    margin: 2.5rem auto;
    padding: 2rem 2.5rem;
    background: #fff;
    border-radius: 10px;
    box-shadow: 0 8px 24px rgba(15, 118, 110, 0.18);
}

main.card.wide { max-width: 880px; }

h1 { margin-top: 0; color: var(--teal-dark); }

.flash {
    max-width: 640px;
    margin: 1rem auto 0;
    padding: 0.65rem 1rem;
    border-radius: 6px;
    font-weight: 600;
}

.flash-success { background: #dcfce7; color: var(--success); }
.flash-danger { background: #fee2e2; color: var(--danger); }

form label {
    display: block;
    margin: 0.9rem 0 0.25rem;
    font-weight: 600;
}

form input, form select, form textarea {
    width: 100%;
    padding: 0.55rem 0.7rem;
    border: 1px solid #cbd5e1;
    border-radius: 6px;
    font-size: 1rem;
}

button, .button {
    display: inline-block;
    margin-top: 1.25rem;
    padding: 0.6rem 1.4rem;
    background: var(--teal);
    color: #fff;
    border: none;
    border-radius: 6px;
    font-size: 1rem;
    font-weight: 600;
    cursor: pointer;
    text-decoration: none;
}

button:hover, .button:hover { background: var(--teal-dark); }

.stats {
    display: flex;
    gap: 1rem;
    margin: 1.25rem 0;
}

.stat {
    flex: 1;
    padding: 1rem;
    text-align: center;
    background: #f0fdfa;
    border-radius: 8px;
}

.stat .value { font-size: 1.8rem; font-weight: 700; color: var(--teal-dark); }
.stat .label { font-size: 0.85rem; text-transform: uppercase; letter-spacing: 0.06em; }

table.listing {
    width: 100%;
    border-collapse: collapse;
    margin-top: 1rem;
}

table.listing th, table.listing td {
    padding: 0.55rem 0.7rem;
    border-bottom: 1px solid #e2e8f0;
    text-align: left;
}

table.listing td.empty { text-align: center; color: #64748b; }

.status-pending { color: #b45309; font-weight: 600; }
.status-completed { color: var(--success); font-weight: 600; }

dl.fields dt {
    float: left;
    width: 9rem;
    clear: left;
    font-weight: 600;
    color: var(--teal-dark);
    padding: 0.4rem 0;
}

dl.fields dd {
    margin-left: 9.5rem;
    padding: 0.4rem 0;
    min-height: 1.2rem;
}

footer {
    text-align: center;
    padding: 1.5rem 0 2rem;
    color: #64748b;
    font-size: 0.85rem;
}
"#;

    Response::builder()
        .header("Content-Type", "text/css")
        .body(css.to_string())
        .unwrap()
}

async fn serve_background() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" width="1200" height="800" viewBox="0 0 1200 800">
  <defs>
    <linearGradient id="wash" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0" stop-color="#ecfeff"/>
      <stop offset="1" stop-color="#ccfbf1"/>
    </linearGradient>
    <pattern id="crosses" width="120" height="120" patternUnits="userSpaceOnUse">
      <path d="M54 42h12v12h12v12H66v12H54V66H42V54h12z" fill="#0f766e" fill-opacity="0.06"/>
    </pattern>
  </defs>
  <rect width="1200" height="800" fill="url(#wash)"/>
  <rect width="1200" height="800" fill="url(#crosses)"/>
</svg>
"##;

    Response::builder()
        .header("Content-Type", "image/svg+xml")
        .body(svg.to_string())
        .unwrap()
}
