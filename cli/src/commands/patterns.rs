use colored::*;
use ignite_common::pattern::TimestampPattern;

use crate::terminal::{colors, print};

pub fn patterns() {
    print::header("timestamp patterns");

    let width = TimestampPattern::NAMED
        .iter()
        .map(|p| p.name().len())
        .max()
        .unwrap_or(0);
    print::set_key_width(width);

    for pattern in TimestampPattern::NAMED {
        let marker = if pattern == TimestampPattern::default() { " (default)" } else { "" };
        let sample = format!("{}{}", pattern.render_now(), marker.color(colors::SEPARATOR));
        print::aligned_line(pattern.name(), sample.color(colors::TEXT_DEFAULT));
    }

    print::fat_separator();
    print::print_status("Custom patterns take strftime syntax, e.g. --pattern 'UTC:%H:%M:%S'");
}
