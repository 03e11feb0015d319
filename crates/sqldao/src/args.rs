//! Statement arguments.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::named::{VariableMap, rewrite_named};
use crate::value::Value;

/// The parameters supplied with a statement.
///
/// Most callers never name this type: every query method takes `impl Into<Args>`,
/// so `()`, a tuple, an array, a `Vec` or a map can be passed directly.
///
/// ```ignore
/// dao.query_for_map_list("SELECT * FROM t", ()).await?;
/// dao.query_for_map_list("SELECT * FROM t WHERE a = ? AND b = ?", (1, "x")).await?;
/// dao.query_for_map_list("SELECT * FROM t WHERE a = ?{a}", vars).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Args {
    /// No parameters; the SQL is sent as written.
    #[default]
    None,
    /// Values for positional `?` markers, in order.
    Positional(Vec<Value>),
    /// Values for `?{name}` placeholders.
    Named(VariableMap),
}

impl Args {
    /// Produce the statement to send and its positional parameters.
    pub fn resolve<'a>(&self, sql: &'a str) -> (Cow<'a, str>, Vec<Value>) {
        match self {
            Args::None => (Cow::Borrowed(sql), Vec::new()),
            Args::Positional(values) => (Cow::Borrowed(sql), values.clone()),
            Args::Named(vars) => {
                let mut params = Vec::new();
                let rewritten = rewrite_named(sql, &mut params, vars);
                (Cow::Owned(rewritten), params)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Args::None => true,
            Args::Positional(values) => values.is_empty(),
            Args::Named(vars) => vars.is_empty(),
        }
    }
}

impl From<()> for Args {
    fn from(_: ()) -> Self {
        Args::None
    }
}

impl<V: Into<Value>> From<Vec<V>> for Args {
    fn from(values: Vec<V>) -> Self {
        Args::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, const N: usize> From<[V; N]> for Args {
    fn from(values: [V; N]) -> Self {
        Args::Positional(values.into_iter().map(Into::into).collect())
    }
}

impl From<&[Value]> for Args {
    fn from(values: &[Value]) -> Self {
        Args::Positional(values.to_vec())
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Args {
    fn from(vars: HashMap<K, V>) -> Self {
        Args::Named(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Args {
    fn from(vars: BTreeMap<K, V>) -> Self {
        Args::Named(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<Value>),+> From<($($name,)+)> for Args {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Args::Positional(vec![$($name.into()),+])
            }
        }
    };
}

impl_from_tuple!(A);
impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);
impl_from_tuple!(A, B, C, D, E);
impl_from_tuple!(A, B, C, D, E, F);
impl_from_tuple!(A, B, C, D, E, F, G);
impl_from_tuple!(A, B, C, D, E, F, G, H);
