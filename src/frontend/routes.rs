use super::templates::TemplateError;

/// The named-route table behind the templates' `url_for` calls. The axum
/// router mounts the same paths; a test in `web::tests` keeps the two in
/// agreement.
const ROUTES: &[(&str, &str)] = &[
    ("home", "/"),
    ("signup", "/signup"),
    ("login", "/login"),
    ("logout", "/logout"),
    ("patient_dashboard", "/patient/dashboard"),
    ("doctor_dashboard", "/doctor/dashboard"),
    ("book_appointment", "/book-appointment"),
    ("view_appointment_patient", "/view-appointment/:id"),
    ("view_appointment_doctor", "/doctor/view-appointment/:id"),
    ("submit_diagnosis", "/doctor/submit-diagnosis/:id"),
    ("patient_profile", "/patient/profile"),
    ("doctor_profile", "/doctor/profile"),
    ("forgot_password", "/forgot-password"),
];

/// Assets served by `frontend::static_files`. `url_for('static', ...)` only
/// resolves filenames registered here, so a renamed asset fails at render
/// time instead of 404ing in the browser.
const ASSETS: &[&str] = &["css/styles.css", "img/clinic-bg.svg"];

pub struct RouteResolver;

impl RouteResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolves a named route to its URL. Parameterized routes cannot be
    /// resolved by name alone; use [`RouteResolver::url_for_with`].
    pub fn url_for(&self, name: &str) -> Result<String, TemplateError> {
        let path = self
            .path_template(name)
            .ok_or_else(|| TemplateError::UnknownRoute(name.to_string()))?;
        if path.contains(':') {
            return Err(TemplateError::MissingRouteParam(name.to_string()));
        }
        Ok(path.to_string())
    }

    /// Resolves a parameterized route, substituting the `:id` segment.
    pub fn url_for_with(&self, name: &str, id: &str) -> Result<String, TemplateError> {
        let path = self
            .path_template(name)
            .ok_or_else(|| TemplateError::UnknownRoute(name.to_string()))?;
        if !path.contains(":id") {
            return Err(TemplateError::UnknownRoute(name.to_string()));
        }
        Ok(path.replace(":id", id))
    }

    pub fn static_url(&self, filename: &str) -> Result<String, TemplateError> {
        if !ASSETS.contains(&filename) {
            return Err(TemplateError::UnknownAsset(filename.to_string()));
        }
        Ok(format!("/static/{}", filename))
    }

    /// The axum path pattern for a named route.
    pub fn path_template(&self, name: &str) -> Option<&'static str> {
        ROUTES
            .iter()
            .find(|(route_name, _)| *route_name == name)
            .map(|(_, path)| *path)
    }

    pub fn route_names(&self) -> impl Iterator<Item = &'static str> {
        ROUTES.iter().map(|(name, _)| *name)
    }
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_routes() {
        let resolver = RouteResolver::new();
        assert_eq!(resolver.url_for("patient_dashboard").unwrap(), "/patient/dashboard");
        assert_eq!(resolver.url_for("logout").unwrap(), "/logout");
        assert_eq!(resolver.url_for("home").unwrap(), "/");
    }

    #[test]
    fn unknown_route_is_an_error() {
        let resolver = RouteResolver::new();
        assert!(matches!(
            resolver.url_for("billing"),
            Err(TemplateError::UnknownRoute(_))
        ));
    }

    #[test]
    fn parameterized_routes_need_an_argument() {
        let resolver = RouteResolver::new();
        assert!(matches!(
            resolver.url_for("view_appointment_patient"),
            Err(TemplateError::MissingRouteParam(_))
        ));
        assert_eq!(
            resolver.url_for_with("view_appointment_patient", "abc").unwrap(),
            "/view-appointment/abc"
        );
    }

    #[test]
    fn static_assets_resolve_when_registered() {
        let resolver = RouteResolver::new();
        assert_eq!(
            resolver.static_url("css/styles.css").unwrap(),
            "/static/css/styles.css"
        );
        assert!(matches!(
            resolver.static_url("img/missing.png"),
            Err(TemplateError::UnknownAsset(_))
        ));
    }
}
