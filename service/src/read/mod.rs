//! Read entities definitions.

pub mod building;
pub mod contract;
pub mod payment;
pub mod room;
pub mod student;

use common::define_text;

define_text! {
    #[doc = "Free-form text to fuzzy search lists for."]
    struct SearchQuery(max_len = 100);
}
