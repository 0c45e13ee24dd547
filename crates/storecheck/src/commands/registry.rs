//! Name-addressed command table.
//!
//! Commands take positional JSON arguments and return a JSON value, so
//! scenarios loaded from data files can drive the same operations the typed
//! command structs expose. The registry is an ordinary value built once per
//! suite; nothing is registered globally.

use super::cart::{CartCommands, CartItem};
use super::navigation::{ModalAction, NavigationCommands};
use crate::context::BrowserSession;
use crate::pages::{ExpectedLine, ModalChoice};
use crate::result::{CheckError, CheckResult};
use crate::wait::SettlePolicy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[cfg(feature = "api")]
use crate::api::{ApiClient, ApiRequest, ApiResponse, ExpectedStructure, RequestBody};
#[cfg(feature = "api")]
use crate::network::HttpMethod;

/// Future returned by a command handler
pub type CommandFuture<'a> = Pin<Box<dyn Future<Output = CheckResult<Value>> + Send + 'a>>;

/// Command handler
pub type CommandHandler = Arc<dyn for<'a> Fn(&'a CommandContext, Vec<Value>) -> CommandFuture<'a> + Send + Sync>;

/// Grouping used for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    /// Moving around the site
    Navigation,
    /// Cart manipulation
    Cart,
    /// JSON API calls
    Api,
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Navigation => "navigation",
            Self::Cart => "cart",
            Self::Api => "api",
        })
    }
}

/// What a handler can reach
#[derive(Debug, Clone)]
pub struct CommandContext {
    session: BrowserSession,
    settle: SettlePolicy,
    pace: Duration,
    #[cfg(feature = "api")]
    api: ApiClient,
}

impl CommandContext {
    /// Context over a session; the API client uses the session's config
    pub fn new(session: BrowserSession) -> CheckResult<Self> {
        #[cfg(feature = "api")]
        let api = ApiClient::new(session.config())?;
        Ok(Self {
            session,
            settle: SettlePolicy::default(),
            pace: super::cart::DEFAULT_PACE,
            #[cfg(feature = "api")]
            api,
        })
    }

    /// Use a different settle step for cart and pagination commands
    #[must_use]
    pub const fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Pause between items of `add_multiple_to_cart`
    #[must_use]
    pub const fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Replace the API client
    #[cfg(feature = "api")]
    #[must_use]
    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = api;
        self
    }

    #[must_use]
    pub const fn session(&self) -> &BrowserSession {
        &self.session
    }

    /// Navigation commands over this context's session
    #[must_use]
    pub fn navigation(&self) -> NavigationCommands {
        NavigationCommands::new(self.session.clone()).with_settle(self.settle)
    }

    /// Cart commands over this context's session
    #[must_use]
    pub fn cart(&self) -> CartCommands {
        CartCommands::new(self.session.clone())
            .with_settle(self.settle)
            .with_pace(self.pace)
    }

    #[cfg(feature = "api")]
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}

struct Entry {
    category: CommandCategory,
    handler: CommandHandler,
}

/// Commands by name
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Entry>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in command
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let navigation: [(&str, fn(&CommandContext, Vec<Value>) -> CommandFuture<'_>); 10] = [
            ("navigate_to", navigate_to),
            ("search_products", search_products),
            ("filter_by_category", filter_by_category),
            ("filter_by_brand", filter_by_brand),
            ("view_product_details", view_product_details),
            ("go_to_page", go_to_page),
            ("scroll_to_element", scroll_to_element),
            ("click_breadcrumb", click_breadcrumb),
            ("handle_modal", handle_modal),
            ("is_in_viewport", is_in_viewport),
        ];
        for (name, handler) in navigation {
            registry.register(name, CommandCategory::Navigation, handler);
        }
        let cart: [(&str, fn(&CommandContext, Vec<Value>) -> CommandFuture<'_>); 9] = [
            ("add_to_cart", add_to_cart),
            ("add_multiple_to_cart", add_multiple_to_cart),
            ("view_cart", view_cart),
            ("remove_from_cart", remove_from_cart),
            ("update_cart_quantity", update_cart_quantity),
            ("get_cart_total", get_cart_total),
            ("verify_cart_item", verify_cart_item),
            ("clear_cart", clear_cart),
            ("proceed_to_checkout", proceed_to_checkout),
        ];
        for (name, handler) in cart {
            registry.register(name, CommandCategory::Cart, handler);
        }
        #[cfg(feature = "api")]
        {
            let api: [(&str, fn(&CommandContext, Vec<Value>) -> CommandFuture<'_>); 5] = [
                ("get_products_api", get_products_api),
                ("get_brands_api", get_brands_api),
                ("search_products_api", search_products_api),
                ("api_request", api_request),
                ("validate_api_response", validate_api_response),
            ];
            for (name, handler) in api {
                registry.register(name, CommandCategory::Api, handler);
            }
        }
        registry
    }

    /// Add or replace a command
    pub fn register<F>(&mut self, name: impl Into<String>, category: CommandCategory, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a CommandContext, Vec<Value>) -> CommandFuture<'a> + Send + Sync + 'static,
    {
        self.commands.insert(
            name.into(),
            Entry {
                category,
                handler: Arc::new(handler),
            },
        );
        self
    }

    /// Run a command by name
    pub async fn invoke(&self, ctx: &CommandContext, name: &str, args: Vec<Value>) -> CheckResult<Value> {
        let entry = self.commands.get(name).ok_or_else(|| CheckError::UnknownCommand {
            name: name.to_string(),
        })?;
        debug!(command = name, category = %entry.category, args = args.len(), "invoke");
        (entry.handler)(ctx, args).await
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Names in one category, sorted
    pub fn names_in(&self, category: CommandCategory) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .filter(move |(_, e)| e.category == category)
            .map(|(k, _)| k.as_str())
    }

    #[must_use]
    pub fn category(&self, name: &str) -> Option<CommandCategory> {
        self.commands.get(name).map(|e| e.category)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Positional argument reader; every failure is a `Config` error naming
/// the command
struct Args<'a> {
    command: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    const fn new(command: &'static str, values: &'a [Value]) -> Self {
        Self { command, values }
    }

    fn error(&self, index: usize, what: &str) -> CheckError {
        CheckError::Config {
            message: format!("{}: argument {index} must be {what}", self.command),
        }
    }

    fn present(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index).filter(|v| !v.is_null())
    }

    fn str(&self, index: usize) -> CheckResult<&'a str> {
        self.opt_str(index)?.ok_or_else(|| self.error(index, "a string"))
    }

    fn opt_str(&self, index: usize) -> CheckResult<Option<&'a str>> {
        match self.present(index) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| self.error(index, "a string")),
        }
    }

    fn u32(&self, index: usize) -> CheckResult<u32> {
        self.opt_u32(index)?
            .ok_or_else(|| self.error(index, "a non-negative integer"))
    }

    fn opt_u32(&self, index: usize) -> CheckResult<Option<u32>> {
        match self.present(index) {
            None => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.error(index, "a non-negative integer")),
        }
    }

    fn index(&self, index: usize) -> CheckResult<usize> {
        Ok(self
            .opt_u32(index)?
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX)))
    }

    fn parse<T: DeserializeOwned>(&self, index: usize, what: &str) -> CheckResult<T> {
        let value = self.present(index).ok_or_else(|| self.error(index, what))?;
        serde_json::from_value(value.clone()).map_err(|e| CheckError::Config {
            message: format!("{}: argument {index} must be {what}: {e}", self.command),
        })
    }
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

fn navigate_to(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let section = Args::new("navigate_to", &args).str(0)?;
        ctx.navigation().navigate_to(section).await?;
        Ok(Value::Null)
    })
}

fn search_products(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let term = Args::new("search_products", &args).str(0)?;
        ctx.navigation().search_products(term).await?;
        Ok(Value::Null)
    })
}

fn filter_by_category(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let args = Args::new("filter_by_category", &args);
        let (category, sub) = (args.str(0)?, args.opt_str(1)?);
        ctx.navigation().filter_by_category(category, sub).await?;
        Ok(Value::Null)
    })
}

fn filter_by_brand(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let brand = Args::new("filter_by_brand", &args).str(0)?;
        ctx.navigation().filter_by_brand(brand).await?;
        Ok(Value::Null)
    })
}

fn view_product_details(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let id = Args::new("view_product_details", &args).u32(0)?;
        ctx.navigation().view_product_details(id).await?;
        Ok(Value::Null)
    })
}

fn go_to_page(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let page = Args::new("go_to_page", &args).u32(0)?;
        ctx.navigation().go_to_page(page).await?;
        Ok(Value::Null)
    })
}

fn scroll_to_element(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let selector = Args::new("scroll_to_element", &args).str(0)?;
        ctx.navigation().scroll_to_element(selector).await?;
        Ok(Value::Null)
    })
}

fn click_breadcrumb(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let text = Args::new("click_breadcrumb", &args).str(0)?;
        ctx.navigation().click_breadcrumb(text).await?;
        Ok(Value::Null)
    })
}

fn handle_modal(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let action = Args::new("handle_modal", &args)
            .opt_str(0)?
            .map_or(ModalAction::Close, ModalAction::parse);
        ctx.navigation().handle_modal(action).await?;
        Ok(Value::Null)
    })
}

fn is_in_viewport(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let selector = Args::new("is_in_viewport", &args).str(0)?;
        ctx.navigation().verify_in_viewport(selector).await?;
        Ok(Value::Bool(true))
    })
}

// ---------------------------------------------------------------------------
// Cart
// ---------------------------------------------------------------------------

fn add_to_cart(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let args = Args::new("add_to_cart", &args);
        let id = args.u32(0)?;
        let quantity = args.opt_u32(1)?.unwrap_or(1);
        let choice = match args.opt_str(2)? {
            Some(s) => s.parse()?,
            None => ModalChoice::default(),
        };
        ctx.cart().add_to_cart(id, quantity, choice).await?;
        Ok(Value::Null)
    })
}

fn add_multiple_to_cart(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let items: Vec<CartItem> =
            Args::new("add_multiple_to_cart", &args).parse(0, "a list of {productId, quantity}")?;
        ctx.cart().add_multiple(&items).await?;
        Ok(Value::Null)
    })
}

fn view_cart(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        ctx.cart().view_cart().await?;
        Ok(Value::Null)
    })
}

fn remove_from_cart(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let index = Args::new("remove_from_cart", &args).index(0)?;
        ctx.cart().remove_from_cart(index).await?;
        Ok(Value::Null)
    })
}

fn update_cart_quantity(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let args = Args::new("update_cart_quantity", &args);
        let (index, quantity) = (args.index(0)?, args.u32(1)?);
        ctx.cart().update_cart_quantity(index, quantity).await?;
        Ok(Value::Null)
    })
}

fn get_cart_total(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let total = ctx.cart().cart_total().await?;
        Ok(Value::from(total))
    })
}

/// Expected row given as `{name, price?, quantity?, total?}`
#[derive(Debug, Deserialize)]
struct ExpectedItem {
    name: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    quantity: Option<u32>,
    #[serde(default)]
    total: Option<String>,
}

fn verify_cart_item(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let item: ExpectedItem =
            Args::new("verify_cart_item", &args).parse(0, "an object with a name")?;
        let expected = ExpectedLine {
            price: item.price,
            quantity: item.quantity,
            total: item.total,
        };
        ctx.cart().verify_cart_item(&item.name, &expected).await?;
        Ok(Value::Null)
    })
}

fn clear_cart(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        ctx.cart().clear_cart().await?;
        Ok(Value::Null)
    })
}

fn proceed_to_checkout(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        ctx.cart().proceed_to_checkout().await?;
        Ok(Value::Null)
    })
}

// ---------------------------------------------------------------------------
// API
// ---------------------------------------------------------------------------

#[cfg(feature = "api")]
fn get_products_api(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move { Ok(serde_json::to_value(ctx.api.get_products().await?)?) })
}

#[cfg(feature = "api")]
fn get_brands_api(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move { Ok(serde_json::to_value(ctx.api.get_brands().await?)?) })
}

#[cfg(feature = "api")]
fn search_products_api(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let term = Args::new("search_products_api", &args).str(0)?;
        Ok(serde_json::to_value(ctx.api.search_products(term).await?)?)
    })
}

/// Free-form request description accepted by `api_request`
///
/// `body` is dropped for GET and when empty; `form` sends it URL-encoded.
#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestSpec {
    #[serde(default = "default_method")]
    method: String,
    endpoint: String,
    #[serde(default)]
    body: serde_json::Map<String, Value>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    form: bool,
}

#[cfg(feature = "api")]
fn default_method() -> String {
    "GET".to_string()
}

#[cfg(feature = "api")]
impl RequestSpec {
    fn into_request(self) -> CheckResult<ApiRequest> {
        let method: HttpMethod = self.method.parse()?;
        let mut request = ApiRequest::new(method, self.endpoint);
        request.headers = self.headers;
        if method != HttpMethod::Get && !self.body.is_empty() {
            request.body = Some(if self.form {
                RequestBody::Form(
                    self.body
                        .into_iter()
                        .map(|(k, v)| {
                            let v = match v {
                                Value::String(s) => s,
                                other => other.to_string(),
                            };
                            (k, v)
                        })
                        .collect(),
                )
            } else {
                RequestBody::Json(Value::Object(self.body))
            });
        }
        Ok(request)
    }
}

#[cfg(feature = "api")]
fn api_request(ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let spec: RequestSpec =
            Args::new("api_request", &args).parse(0, "a request object with an endpoint")?;
        let response = ctx.api.request(&spec.into_request()?).await?;
        Ok(serde_json::to_value(response)?)
    })
}

#[cfg(feature = "api")]
fn validate_api_response(_ctx: &CommandContext, args: Vec<Value>) -> CommandFuture<'_> {
    Box::pin(async move {
        let args = Args::new("validate_api_response", &args);
        let response: ApiResponse = args.parse(0, "a response object")?;
        let expected: ExpectedStructure = args.parse(1, "an expected structure")?;
        response.validate(&expected)?;
        Ok(Value::Bool(true))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::test_support::Storefront;
    use serde_json::json;

    fn context(store: &Storefront) -> CommandContext {
        CommandContext::new(store.session.clone())
            .unwrap()
            .with_settle(SettlePolicy::fixed_ms(10))
            .with_pace(Duration::from_millis(10))
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn test_defaults_cover_every_category() {
            let registry = CommandRegistry::with_defaults();
            assert_eq!(registry.names_in(CommandCategory::Navigation).count(), 10);
            assert_eq!(registry.names_in(CommandCategory::Cart).count(), 9);
            assert_eq!(registry.category("add_to_cart"), Some(CommandCategory::Cart));
            #[cfg(feature = "api")]
            assert_eq!(registry.len(), 24);
        }

        #[tokio::test]
        async fn test_unknown_command() {
            let store = Storefront::new();
            let err = CommandRegistry::with_defaults()
                .invoke(&context(&store), "teleport", vec![])
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::UnknownCommand { ref name } if name == "teleport"));
        }

        #[tokio::test]
        async fn test_custom_command() {
            fn current_url(ctx: &CommandContext, _args: Vec<Value>) -> CommandFuture<'_> {
                Box::pin(async move { Ok(Value::String(ctx.session().current_url().await?)) })
            }
            let store = Storefront::new();
            let mut registry = CommandRegistry::new();
            registry.register("current_url", CommandCategory::Navigation, current_url);
            let url = registry
                .invoke(&context(&store), "current_url", vec![])
                .await
                .unwrap();
            assert_eq!(url, json!("about:blank"));
        }

        #[tokio::test]
        async fn test_bad_arguments_are_config_errors() {
            let store = Storefront::new();
            let ctx = context(&store);
            let registry = CommandRegistry::with_defaults();
            let err = registry.invoke(&ctx, "navigate_to", vec![]).await.unwrap_err();
            assert!(matches!(err, CheckError::Config { .. }));
            let err = registry
                .invoke(&ctx, "add_to_cart", vec![json!("one")])
                .await
                .unwrap_err();
            assert!(err.to_string().contains("add_to_cart"));
        }
    }

    mod flow_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_cart_flow_by_name() {
            let store = Storefront::new();
            let ctx = context(&store);
            let registry = CommandRegistry::with_defaults();
            registry
                .invoke(
                    &ctx,
                    "add_multiple_to_cart",
                    vec![json!([{"productId": 1, "quantity": 2}, {"productId": 2}])],
                )
                .await
                .unwrap();
            registry.invoke(&ctx, "view_cart", vec![]).await.unwrap();
            registry
                .invoke(
                    &ctx,
                    "verify_cart_item",
                    vec![json!({"name": "Blue Top", "price": "Rs. 500", "quantity": 2, "total": "Rs. 1000"})],
                )
                .await
                .unwrap();
            let total = registry.invoke(&ctx, "get_cart_total", vec![]).await.unwrap();
            assert_eq!(total.as_f64(), Some(1400.0));
            registry
                .invoke(&ctx, "remove_from_cart", vec![json!(0)])
                .await
                .unwrap();
            assert_eq!(store.cart(), vec![(2, 1)]);
        }

        #[tokio::test(start_paused = true)]
        async fn test_navigation_by_name() {
            let store = Storefront::new();
            store.session.visit("/").await.unwrap();
            let ctx = context(&store);
            let registry = CommandRegistry::with_defaults();
            registry
                .invoke(&ctx, "navigate_to", vec![json!("Products")])
                .await
                .unwrap();
            assert!(store.url().ends_with("/products"));
            let err = registry
                .invoke(&ctx, "navigate_to", vec![json!("basement")])
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::UnknownSection { .. }));
        }
    }

    #[cfg(feature = "api")]
    mod api_tests {
        use super::*;

        #[test]
        fn test_request_spec_drops_body_for_get() {
            let spec: RequestSpec =
                serde_json::from_value(json!({"endpoint": "/productsList", "body": {"a": 1}})).unwrap();
            let request = spec.into_request().unwrap();
            assert_eq!(request.method, HttpMethod::Get);
            assert!(request.body.is_none());
        }

        #[test]
        fn test_request_spec_form() {
            let spec: RequestSpec = serde_json::from_value(json!({
                "method": "post",
                "endpoint": "/searchProduct",
                "body": {"search_product": "top", "page": 2},
                "form": true
            }))
            .unwrap();
            let request = spec.into_request().unwrap();
            let Some(RequestBody::Form(mut fields)) = request.body else {
                panic!("expected a form body");
            };
            fields.sort();
            assert_eq!(
                fields,
                vec![
                    ("page".to_string(), "2".to_string()),
                    ("search_product".to_string(), "top".to_string()),
                ]
            );
        }

        #[tokio::test]
        async fn test_validate_by_name() {
            let store = Storefront::new();
            let response = json!({
                "status": 200,
                "headers": {},
                "body": {"responseCode": 200, "products": []}
            });
            let registry = CommandRegistry::with_defaults();
            let ok = registry
                .invoke(
                    &context(&store),
                    "validate_api_response",
                    vec![response.clone(), json!({"statusCode": 200, "hasData": true})],
                )
                .await
                .unwrap();
            assert_eq!(ok, json!(true));
            let err = registry
                .invoke(
                    &context(&store),
                    "validate_api_response",
                    vec![response, json!({"responseCode": 404})],
                )
                .await
                .unwrap_err();
            assert!(matches!(err, CheckError::AssertionFailed { .. }));
        }
    }
}
