//! Terminal presentation of checkout notices and navigation.

#![allow(clippy::print_stdout)]

use furnistore_storefront::checkout::{CheckoutUi, Notice, NoticeKind, Route};

/// Prints notices and tells the user which command to run next.
pub struct TerminalUi;

impl CheckoutUi for TerminalUi {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Success => println!("✔ {}", notice.message),
            NoticeKind::Failure => println!("✘ {}", notice.message),
        }
    }

    fn navigate(&self, route: Route) {
        match route {
            Route::OrderHistory => println!("Run `furnistore orders` to see your order history."),
            Route::Login => {
                println!("Sign in again with `furnistore login -u <username> -p <password>`.");
            }
        }
    }
}
