lazy_static::lazy_static! {
    /// Host name of the application. The web server only listens to request with a matching host name.
    ///
    /// Field name: `API_HOST`
    pub static ref API_HOST: String = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());

    /// The application port.
    ///
    /// Field name: `API_PORT`
    pub static ref API_PORT: String = std::env::var("API_PORT").unwrap_or_else(|_| "3500".to_owned());

    /// Directory with signed pass archives, named `<serialNumber>.pkpass`.
    ///
    /// Field name: `PASS_DIRECTORY`
    pub static ref PASS_DIRECTORY: String = std::env::var("PASS_DIRECTORY").unwrap_or_else(|_| "passes".to_owned());

    /// Authentication token embedded in the served passes. Without it any
    /// well formed `ApplePass` header is accepted.
    ///
    /// Field name: `AUTHENTICATION_TOKEN`
    pub static ref AUTHENTICATION_TOKEN: Option<String> = std::env::var("AUTHENTICATION_TOKEN").ok().filter(|token| !token.is_empty());

    /// Pin the authorization failure status, `401` or `403`. Any other value
    /// stops the server during startup.
    ///
    /// Field name: `UNAUTHORIZED_STATUS`
    pub static ref UNAUTHORIZED_STATUS: String = std::env::var("UNAUTHORIZED_STATUS").unwrap_or_else(|_| "401".to_owned());
}
