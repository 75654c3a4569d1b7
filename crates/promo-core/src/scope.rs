//! # Rule Scopes
//!
//! What a rule is matched against: a whole cart or a single line item, each
//! paired with the evaluation context.

use crate::cart::{Cart, Context, LineItem};

/// Cart-wide evaluation scope
#[derive(Debug, Clone, Copy)]
pub struct CartScope<'a> {
    pub cart: &'a Cart,
    pub context: &'a Context,
}

impl<'a> CartScope<'a> {
    pub fn new(cart: &'a Cart, context: &'a Context) -> Self {
        Self { cart, context }
    }

    /// Narrow to a single line item, keeping the context
    pub fn for_item(&self, item: &'a LineItem) -> LineItemScope<'a> {
        LineItemScope::new(item, self.context)
    }
}

/// Single line item evaluation scope
#[derive(Debug, Clone, Copy)]
pub struct LineItemScope<'a> {
    pub item: &'a LineItem,
    pub context: &'a Context,
}

impl<'a> LineItemScope<'a> {
    pub fn new(item: &'a LineItem, context: &'a Context) -> Self {
        Self { item, context }
    }
}

/// Scope a rule is matched against
#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Cart(CartScope<'a>),
    LineItem(LineItemScope<'a>),
}

impl<'a> Scope<'a> {
    /// Context of either variant
    pub fn context(&self) -> &'a Context {
        match self {
            Scope::Cart(scope) => scope.context,
            Scope::LineItem(scope) => scope.context,
        }
    }

    /// Active currency id of either variant
    pub fn currency_id(&self) -> &'a str {
        &self.context().currency_id
    }
}

impl<'a> From<CartScope<'a>> for Scope<'a> {
    fn from(scope: CartScope<'a>) -> Self {
        Scope::Cart(scope)
    }
}

impl<'a> From<LineItemScope<'a>> for Scope<'a> {
    fn from(scope: LineItemScope<'a>) -> Self {
        Scope::LineItem(scope)
    }
}
