//! Declarative client definitions.
//!
//! [`net_client!`] and [`async_net_client!`] turn a list of remote
//! signatures into a struct with one typed method per binding. Bindings are
//! numbered in declaration order, so the ids a struct registers never
//! change between connections.

#[doc(hidden)]
#[macro_export]
macro_rules! __hnet_ret {
    () => { () };
    ($ret:ty) => { $ret };
}

/// Define a blocking client struct.
///
/// Each entry names a method, its arguments and result, and the remote
/// expression it is bound to. Omitting the result type means unit.
///
/// ```no_run
/// hnet_session::net_client! {
///     pub struct Calc {
///         fn add(x: i32, y: i32) -> i32 = "\\x y.x+y";
///         fn log(line: String) = "putStrLn";
///     }
/// }
///
/// # fn main() -> hnet_session::Result<()> {
/// let mut calc = Calc::connect_hostport("localhost:8080")?;
/// assert_eq!(calc.add(3, 4)?, 7);
/// calc.log("done".to_string())?;
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! net_client {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                fn $fname:ident ( $($arg:ident : $aty:ty),* $(,)? ) $(-> $ret:ty)? = $expr:expr ;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            __hnet_client: $crate::Client,
            $( $fname: $crate::Rpc<($($aty,)*), $crate::__hnet_ret!($($ret)?)>, )*
        }

        #[allow(dead_code)]
        impl $name {
            /// Connect over `conn` and register every binding.
            pub fn connect(conn: $crate::Connection) -> $crate::Result<Self> {
                Self::connect_with_config(conn, $crate::SessionConfig::default())
            }

            pub fn connect_with_config(
                conn: $crate::Connection,
                config: $crate::SessionConfig,
            ) -> $crate::Result<Self> {
                let mut builder = $crate::ClientBuilder::with_config(config);
                $(
                    let $fname = builder.bind::<($($aty,)*), $crate::__hnet_ret!($($ret)?)>(
                        stringify!($fname),
                        $expr,
                    );
                )*
                Ok(Self {
                    __hnet_client: builder.connect(conn)?,
                    $( $fname, )*
                })
            }

            /// Connect to a `host:port` address.
            pub fn connect_hostport(hostport: &str) -> $crate::Result<Self> {
                Self::connect($crate::connect_hostport(hostport)?)
            }

            /// Replace the connection, registering the same bindings again.
            pub fn reconnect(&mut self, conn: $crate::Connection) -> $crate::Result<()> {
                self.__hnet_client.reconnect(conn)
            }

            pub fn connection(&self) -> &$crate::Connection {
                self.__hnet_client.connection()
            }

            $(
                $(#[$fmeta])*
                pub fn $fname(&mut self, $($arg: $aty),*)
                    -> $crate::Result<$crate::__hnet_ret!($($ret)?)>
                {
                    self.__hnet_client.call(&self.$fname, &($($arg,)*))
                }
            )*
        }
    };
}

/// Define a pipelining client struct.
///
/// Takes the same entries as [`net_client!`], but every method also takes
/// a continuation that receives the result. Methods return once the
/// request is written; continuations run from `drive` in call order.
///
/// ```no_run
/// hnet_session::async_net_client! {
///     pub struct Calc {
///         fn add(x: i32, y: i32) -> i32 = "\\x y.x+y";
///     }
/// }
///
/// # fn main() -> hnet_session::Result<()> {
/// let mut calc = Calc::connect_hostport("localhost:8080")?;
/// calc.add(3, 4, |sum| println!("3 + 4 = {sum}"))?;
/// while calc.pending_requests() > 0 {
///     calc.drive()?;
/// }
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! async_net_client {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                fn $fname:ident ( $($arg:ident : $aty:ty),* $(,)? ) $(-> $ret:ty)? = $expr:expr ;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            __hnet_client: $crate::AsyncClient,
            $( $fname: $crate::Rpc<($($aty,)*), $crate::__hnet_ret!($($ret)?)>, )*
        }

        #[allow(dead_code)]
        impl $name {
            /// Connect over `conn` and register every binding. The
            /// connection is left non-blocking.
            pub fn connect(conn: $crate::Connection) -> $crate::Result<Self> {
                Self::connect_with_config(conn, $crate::SessionConfig::default())
            }

            pub fn connect_with_config(
                conn: $crate::Connection,
                config: $crate::SessionConfig,
            ) -> $crate::Result<Self> {
                let mut builder = $crate::ClientBuilder::with_config(config);
                $(
                    let $fname = builder.bind::<($($aty,)*), $crate::__hnet_ret!($($ret)?)>(
                        stringify!($fname),
                        $expr,
                    );
                )*
                Ok(Self {
                    __hnet_client: builder.connect_async(conn)?,
                    $( $fname, )*
                })
            }

            /// Connect to a `host:port` address.
            pub fn connect_hostport(hostport: &str) -> $crate::Result<Self> {
                Self::connect($crate::connect_hostport(hostport)?)
            }

            /// Replace the connection, registering the same bindings again.
            /// Calls still pending on the old connection are dropped.
            pub fn reconnect(&mut self, conn: $crate::Connection) -> $crate::Result<()> {
                self.__hnet_client.reconnect(conn)
            }

            /// Deliver whatever results have arrived. Never blocks.
            pub fn drive(&mut self) -> $crate::Result<usize> {
                self.__hnet_client.drive()
            }

            pub fn pending_requests(&self) -> usize {
                self.__hnet_client.pending_requests()
            }

            pub fn connection(&self) -> &$crate::Connection {
                self.__hnet_client.connection()
            }

            $(
                $(#[$fmeta])*
                pub fn $fname(
                    &mut self,
                    $($arg: $aty,)*
                    k: impl FnOnce($crate::__hnet_ret!($($ret)?)) + 'static,
                ) -> $crate::Result<()> {
                    self.__hnet_client.call(&self.$fname, &($($arg,)*), k)
                }
            )*
        }
    };
}
