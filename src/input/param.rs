//! Typed decoding of bound parameters.

use {
    crate::input::Params,
    failure::Fail,
    std::any::TypeId,
    std::fmt,
};

/// An error produced while decoding bound parameters.
///
/// These are runtime errors returned to the handler; the router never
/// converts them into an HTTP status on its own.
#[derive(Debug, Fail)]
pub enum BindError {
    /// No value was bound under the requested name.
    #[fail(display = "parameter {:?} is not bound", name)]
    Missing { name: String },

    /// The bound value failed to parse into the requested type.
    #[fail(display = "failed to parse parameter {:?}: {}", name, message)]
    Parse { name: String, message: String },

    /// The matched resource declared no parameter type.
    #[fail(display = "no parameter type is declared for this route")]
    NoSchema,

    /// The declared parameter type differs from the requested one.
    #[fail(display = "the declared parameter type is {}", declared)]
    SchemaMismatch { declared: &'static str },
}

impl BindError {
    pub(crate) fn missing(name: &str) -> Self {
        BindError::Missing {
            name: name.to_owned(),
        }
    }
}

/// A value parseable from the raw string bound by a matcher.
///
/// Implemented for the primitive types out of the box; implement it for
/// your own types to hook custom parsing into [`Params::parse`] and
/// [`bind_params!`].
///
/// [`Params::parse`]: ../struct.Params.html#method.parse
/// [`bind_params!`]: ../../macro.bind_params.html
pub trait FromBinding: Sized {
    type Err: fmt::Display;

    fn from_binding(s: &str) -> Result<Self, Self::Err>;
}

macro_rules! impl_from_binding {
    ($($t:ty),*) => {$(
        impl FromBinding for $t {
            type Err = <$t as std::str::FromStr>::Err;

            #[inline]
            fn from_binding(s: &str) -> Result<Self, Self::Err> {
                s.parse()
            }
        }
    )*};
}

impl_from_binding!(bool, char, f32, f64, String);
impl_from_binding!(i8, i16, i32, i64, i128, isize);
impl_from_binding!(u8, u16, u32, u64, u128, usize);

pub(crate) fn parse_with<T: FromBinding>(name: &str, value: &str) -> Result<T, BindError> {
    T::from_binding(value).map_err(|e| BindError::Parse {
        name: name.to_owned(),
        message: e.to_string(),
    })
}

/// A parameter struct decodable from the routing context.
///
/// Implementations are usually generated with [`bind_params!`]; the
/// struct is declared on a resource with [`Resource::params`] and
/// decoded in the handler with [`Input::typed_params`].
///
/// [`bind_params!`]: ../../macro.bind_params.html
/// [`Resource::params`]: ../../router/struct.Resource.html#method.params
/// [`Input::typed_params`]: ../struct.Input.html#method.typed_params
pub trait BindParams: Sized + 'static {
    fn bind(params: &Params<'_>) -> Result<Self, BindError>;
}

/// A record of the parameter struct declared on a resource.
///
/// The spec is installed into the context by the method-handler leaf
/// just before dispatching, so the handler can decode without naming
/// the route again.
#[derive(Clone, Copy)]
pub struct ParamsSpec {
    type_id: TypeId,
    type_name: &'static str,
}

impl fmt::Debug for ParamsSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ParamsSpec").field(&self.type_name).finish()
    }
}

impl ParamsSpec {
    pub fn of<T: BindParams>() -> Self {
        ParamsSpec {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Declares a parameter struct together with its [`BindParams`] impl.
///
/// Each field names its source: `param` for a path binding, `query` for
/// a URL query value. The key is given explicitly, so a field may use
/// an alias differing from its own name. Missing queries fall back to
/// the field's `Default`; missing params are an error.
///
/// ```
/// tsuji::bind_params! {
///     /// Parameters accepted by the article endpoints.
///     pub struct ArticleParams {
///         id: u64 = param "id",
///         page: u32 = query "page",
///     }
/// }
/// ```
///
/// [`BindParams`]: ./input/param/trait.BindParams.html
#[macro_export]
macro_rules! bind_params {
    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $( $field:ident : $ty:ty = $source:ident $key:literal ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[derive(Debug)]
        $vis struct $name {
            $( $vis $field : $ty, )*
        }

        impl $crate::input::BindParams for $name {
            fn bind(
                params: &$crate::input::Params<'_>,
            ) -> std::result::Result<Self, $crate::input::BindError> {
                std::result::Result::Ok(Self {
                    $( $field: $crate::__bind_field!(params, $source, $key), )*
                })
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __bind_field {
    ($params:expr, param, $key:literal) => {
        $params.parse($key)?
    };
    ($params:expr, query, $key:literal) => {
        $params.parse_query($key)?.unwrap_or_default()
    };
}
