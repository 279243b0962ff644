//! Substitution-only HTML templates.
//!
//! A page render is a pure function of its context object and the route
//! resolver: templates carry no branching, no loops, no computed state.
//! Handlers pre-render anything repeated or conditional (flash blocks,
//! table rows) and inject it through raw placeholders.
//!
//! Placeholder forms:
//! - `{{ expr }}` substitutes HTML-escaped
//! - `{{{ expr }}}` substitutes raw (pre-rendered fragments only)
//!
//! where `expr` is a dotted context path (`user.name`), a
//! `url_for('route_name')` call, or `url_for('static', filename='...')`.
//!
//! A missing context key is a render-time error, not a silent blank; an
//! empty-string value renders as an empty slot.

use serde_json::Value;
use thiserror::Error;

use super::routes::RouteResolver;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Template '{template}': missing context key '{key}'")]
    MissingKey { template: String, key: String },
    #[error("Template '{template}': context key '{key}' is not a scalar")]
    NonScalarValue { template: String, key: String },
    #[error("Unknown route name: {0}")]
    UnknownRoute(String),
    #[error("Route '{0}' takes a parameter and cannot be resolved by name alone")]
    MissingRouteParam(String),
    #[error("Unknown static asset: {0}")]
    UnknownAsset(String),
    #[error("Template '{template}': {detail}")]
    Syntax { template: String, detail: String },
}

/// Compile-time embedded template sources, addressed by name.
pub fn template_source(name: &str) -> Option<&'static str> {
    Some(match name {
        "index" => include_str!("templates/index.html"),
        "signup" => include_str!("templates/signup.html"),
        "login" => include_str!("templates/login.html"),
        "forgot_password" => include_str!("templates/forgot_password.html"),
        "patient_dashboard" => include_str!("templates/patient_dashboard.html"),
        "doctor_dashboard" => include_str!("templates/doctor_dashboard.html"),
        "book_appointment" => include_str!("templates/book_appointment.html"),
        "view_appointment_patient" => include_str!("templates/view_appointment_patient.html"),
        "view_appointment_doctor" => include_str!("templates/view_appointment_doctor.html"),
        "patient_profile" => include_str!("templates/patient_profile.html"),
        "doctor_profile" => include_str!("templates/doctor_profile.html"),
        _ => return None,
    })
}

pub fn render(name: &str, ctx: &Value, resolver: &RouteResolver) -> Result<String, TemplateError> {
    let source =
        template_source(name).ok_or_else(|| TemplateError::UnknownTemplate(name.to_string()))?;
    render_source(name, source, ctx, resolver)
}

fn render_source(
    name: &str,
    source: &str,
    ctx: &Value,
    resolver: &RouteResolver,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];

        let (raw, open, close) = if after.starts_with("{{{") {
            (true, 3, "}}}")
        } else {
            (false, 2, "}}")
        };

        let body = &after[open..];
        let end = body.find(close).ok_or_else(|| TemplateError::Syntax {
            template: name.to_string(),
            detail: "unterminated placeholder".to_string(),
        })?;

        let expr = body[..end].trim();
        let value = eval_expr(name, expr, ctx, resolver)?;
        if raw {
            out.push_str(&value);
        } else {
            out.push_str(&escape_html(&value));
        }

        rest = &body[end + close.len()..];
    }
    out.push_str(rest);

    Ok(out)
}

fn eval_expr(
    template: &str,
    expr: &str,
    ctx: &Value,
    resolver: &RouteResolver,
) -> Result<String, TemplateError> {
    if let Some(args) = expr.strip_prefix("url_for(") {
        let args = args.strip_suffix(')').ok_or_else(|| TemplateError::Syntax {
            template: template.to_string(),
            detail: format!("malformed url_for call: {}", expr),
        })?;
        return eval_url_for(template, args, resolver);
    }

    let mut current = ctx;
    for part in expr.split('.') {
        current = current.get(part).ok_or_else(|| TemplateError::MissingKey {
            template: template.to_string(),
            key: expr.to_string(),
        })?;
    }

    match current {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(TemplateError::NonScalarValue {
            template: template.to_string(),
            key: expr.to_string(),
        }),
    }
}

fn eval_url_for(
    template: &str,
    args: &str,
    resolver: &RouteResolver,
) -> Result<String, TemplateError> {
    let syntax = |detail: String| TemplateError::Syntax {
        template: template.to_string(),
        detail,
    };

    let mut parts = args.splitn(2, ',');
    let name = parse_single_quoted(parts.next().unwrap_or(""))
        .ok_or_else(|| syntax(format!("url_for expects a quoted route name: {}", args)))?;

    match parts.next() {
        None => {
            if name == "static" {
                Err(syntax("url_for('static') requires filename=...".to_string()))
            } else {
                resolver.url_for(name)
            }
        }
        Some(keyword) => {
            if name != "static" {
                return Err(syntax(format!(
                    "url_for('{}') does not take keyword arguments",
                    name
                )));
            }
            let filename = keyword
                .trim()
                .strip_prefix("filename=")
                .and_then(parse_single_quoted)
                .ok_or_else(|| syntax(format!("malformed filename argument: {}", keyword)))?;
            resolver.static_url(filename)
        }
    }
}

fn parse_single_quoted(input: &str) -> Option<&str> {
    input.trim().strip_prefix('\'')?.strip_suffix('\'')
}

/// Escapes text for interpolation into HTML bodies and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> RouteResolver {
        RouteResolver::new()
    }

    // Exercise the scanner without registering a template file.
    fn render_str(source: &str, ctx: &Value) -> Result<String, TemplateError> {
        render_source("inline", source, ctx, &resolver())
    }

    #[test]
    fn substitutes_dotted_paths() {
        let ctx = json!({"user": {"name": "Jane Doe", "age": 34}});
        let out = render_str("<p>{{ user.name }} is {{ user.age }}</p>", &ctx).unwrap();
        assert_eq!(out, "<p>Jane Doe is 34</p>");
    }

    #[test]
    fn missing_key_is_an_error() {
        let ctx = json!({"user": {"name": "Jane"}});
        let err = render_str("{{ user.email }}", &ctx).unwrap_err();
        assert!(matches!(err, TemplateError::MissingKey { .. }));
    }

    #[test]
    fn empty_string_renders_empty_slot() {
        let ctx = json!({"user": {"address": ""}});
        let out = render_str("<dd>{{ user.address }}</dd>", &ctx).unwrap();
        assert_eq!(out, "<dd></dd>");
    }

    #[test]
    fn non_scalar_values_are_errors() {
        let ctx = json!({"user": {"tags": ["a", "b"]}});
        assert!(matches!(
            render_str("{{ user.tags }}", &ctx).unwrap_err(),
            TemplateError::NonScalarValue { .. }
        ));
        let ctx = json!({"user": {"address": null}});
        assert!(matches!(
            render_str("{{ user.address }}", &ctx).unwrap_err(),
            TemplateError::NonScalarValue { .. }
        ));
    }

    #[test]
    fn escapes_html_in_values() {
        let ctx = json!({"name": "<script>alert('x')</script>"});
        let out = render_str("{{ name }}", &ctx).unwrap();
        assert_eq!(
            out,
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn raw_placeholder_skips_escaping() {
        let ctx = json!({"rows": "<tr><td>1</td></tr>"});
        let out = render_str("<table>{{{ rows }}}</table>", &ctx).unwrap();
        assert_eq!(out, "<table><tr><td>1</td></tr></table>");
    }

    #[test]
    fn resolves_url_for() {
        let ctx = json!({});
        let out = render_str(
            "<a href=\"{{ url_for('patient_dashboard') }}\">Dashboard</a>",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "<a href=\"/patient/dashboard\">Dashboard</a>");
    }

    #[test]
    fn resolves_static_asset_url() {
        let ctx = json!({});
        let out = render_str(
            "{{ url_for('static', filename='css/styles.css') }}",
            &ctx,
        )
        .unwrap();
        assert_eq!(out, "/static/css/styles.css");
    }

    #[test]
    fn unknown_route_and_asset_fail_at_render_time() {
        let ctx = json!({});
        assert!(matches!(
            render_str("{{ url_for('billing') }}", &ctx).unwrap_err(),
            TemplateError::UnknownRoute(_)
        ));
        assert!(matches!(
            render_str("{{ url_for('static', filename='nope.png') }}", &ctx).unwrap_err(),
            TemplateError::UnknownAsset(_)
        ));
    }

    #[test]
    fn unterminated_placeholder_is_a_syntax_error() {
        let ctx = json!({"a": "b"});
        assert!(matches!(
            render_str("{{ a", &ctx).unwrap_err(),
            TemplateError::Syntax { .. }
        ));
    }

    #[test]
    fn rendering_is_idempotent() {
        let ctx = json!({
            "user": {
                "name": "Jane Doe",
                "email": "jane@example.com",
                "age": 34,
                "address": "12 Elm St",
                "mobile": "555-0100"
            },
            "flash_messages": "",
            "year": 2025
        });
        let first = render("patient_profile", &ctx, &resolver()).unwrap();
        let second = render("patient_profile", &ctx, &resolver()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn profile_template_contains_each_field_once() {
        let ctx = json!({
            "user": {
                "name": "Jane Doe",
                "email": "jane@example.com",
                "age": 34,
                "address": "12 Elm St",
                "mobile": "555-0100"
            },
            "flash_messages": "",
            "year": 2025
        });
        let out = render("patient_profile", &ctx, &resolver()).unwrap();

        for value in ["Jane Doe", "jane@example.com", "12 Elm St", "555-0100"] {
            assert_eq!(out.matches(value).count(), 1, "field {}", value);
        }
        assert_eq!(out.matches(">34<").count(), 1);

        // Navigation links are the resolver's output, verbatim.
        assert!(out.contains("href=\"/patient/dashboard\""));
        assert!(out.contains("href=\"/logout\""));
    }

    #[test]
    fn unknown_template_is_an_error() {
        assert!(matches!(
            render("billing", &json!({}), &resolver()).unwrap_err(),
            TemplateError::UnknownTemplate(_)
        ));
    }
}
