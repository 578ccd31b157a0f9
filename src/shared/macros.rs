/***************************************/
/*               Macros                */
/***************************************/

/// Unwraps a start-up `Result`, or logs what failed and exits with status 1.
#[macro_export]
macro_rules! unwrap_or_exit {
    ($expr:expr, $what:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => {
                log::error!("Failed to {}: {:#}", $what, e);
                std::process::exit(1);
            }
        }
    };
}
