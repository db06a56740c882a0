mod hit;
mod redirect;

pub use hit::{CrawlerHits, DailyHits, HitEvent, MonthlyHits, NewHit, RedirectHits};
pub use redirect::{NewRedirect, Redirect};
