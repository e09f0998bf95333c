// Colored terminal output for the item plot and the centroid plot.
//
// The plots themselves are drawn by the web front end; the CLI prints the
// same data as ranked tables.

use colored::{ColoredString, Colorize};

use crate::pipeline::centroid_plot::CentroidPlotView;
use crate::pipeline::item_plot::ItemPlotView;
use crate::presentation::{CategoryOption, LegendGroup};
use crate::ternary::centroids::Centroid;
use crate::ternary::colors::ColoredCentroid;
use crate::ternary::Ternary;

/// Display the item plot as a table, largest bubbles first.
pub fn display_item_plot(view: &ItemPlotView, limit: usize) {
    if view.items.is_empty() {
        println!("{}", view.status.yellow());
        return;
    }

    println!(
        "\n{}",
        format!("=== {} positions ({} shown) ===", view.entity_label, view.displayed).bold()
    );
    println!();
    println!(
        "  {:<40} {:>8}  {:>6} {:>6} {:>6}  {:>6}",
        "Item".dimmed(),
        "Mentions".dimmed(),
        "US".dimmed(),
        "RU".dimmed(),
        "Mid".dimmed(),
        "Size".dimmed(),
    );
    println!("  {}", "-".repeat(80).dimmed());

    let mut items: Vec<_> = view.items.iter().collect();
    items.sort_by(|a, b| b.size_px.total_cmp(&a.size_px));

    for item in items.iter().take(limit) {
        println!(
            "  {:<40} {:>8.0}  {}  {:>6.1}",
            super::truncate_chars(&item.hover_text, 37),
            item.total_mentions,
            format_shares(&item.proportions),
            item.size_px,
        );
    }
    if items.len() > limit {
        println!("  {}", format!("... and {} more", items.len() - limit).dimmed());
    }

    println!();
    println!(
        "  Sizes {:.0}-{:.0}px (power {:.1}), mentions {:.0}-{:.0}",
        view.sizing.min_size,
        view.sizing.max_size,
        view.sizing.scaling_power,
        view.mentions_range.0,
        view.mentions_range.1,
    );
    println!("  {}", view.status.dimmed());
}

/// Display group and country centroids with their legend buckets.
pub fn display_centroid_plot(view: &CentroidPlotView) {
    println!(
        "\n{}",
        format!(
            "=== Amplified {} centroids (power {:.1}, {} items) ===",
            view.entity_label, view.power, view.items_used
        )
        .bold()
    );

    if !view.group_centroids.is_empty() {
        println!();
        println!("  {:<40} {:>6} {:>6} {:>6}", "Group".dimmed(), "US".dimmed(), "RU".dimmed(), "Mid".dimmed());
        println!("  {}", "-".repeat(62).dimmed());
        for c in &view.group_centroids {
            print_centroid(c, &c.marker_color);
        }
    }

    if !view.legend.is_empty() {
        for group in &view.legend.groups {
            print_legend_group(group);
        }
        if !view.legend.uncategorized.is_empty() {
            print_bucket("Other (uncategorized)", &view.legend.uncategorized);
        }
        if !view.legend.ungrouped.is_empty() {
            print_bucket("Other (no grouping)", &view.legend.ungrouped);
        }
    }

    println!();
    println!("  {}", view.status.dimmed());
}

/// Display the country picker, marking countries with no usage.
pub fn display_country_options(options: &[CategoryOption]) {
    if options.is_empty() {
        println!("No countries loaded. Run `oewg-ternary import` first.");
        return;
    }
    println!("\n{}", format!("=== Countries ({}) ===", options.len()).bold());
    for o in options {
        let line = format!("  {:<8} {:<40} {:>8.0}", o.value.to_string(), o.label, o.total_weight);
        if o.disabled {
            println!("{}", line.dimmed());
        } else {
            println!("{line}");
        }
    }
}

fn print_legend_group(group: &LegendGroup) {
    print_bucket(&group.name, &group.centroids);
}

fn print_bucket(name: &str, centroids: &[ColoredCentroid]) {
    println!("\n  {}", name.bold());
    for c in centroids {
        print_centroid(&c.centroid, &c.color);
    }
}

fn print_centroid(c: &Centroid, color: &str) {
    println!("{}", centroid_line(c, color));
}

/// One table row for a centroid; the centre sentinel is labelled rather
/// than printed as a position.
fn centroid_line(c: &Centroid, color: &str) -> String {
    let label = super::truncate_chars(&c.label, 35);
    if c.has_data() {
        format!("  {} {:<38} {}", colorize("●", color), label, format_shares(&c.position))
    } else {
        format!("  {} {:<38} {}", "○".dimmed(), label, "(no data)".dimmed())
    }
}

fn format_shares(t: &Ternary) -> String {
    format!("{:>5.1}% {:>5.1}% {:>5.1}%", t.us * 100.0, t.russia * 100.0, t.middle * 100.0)
}

/// Map a marker colour name onto the nearest terminal colour.
fn colorize(text: &str, color: &str) -> ColoredString {
    match color {
        "blue" => text.blue(),
        "red" => text.red(),
        "green" => text.green(),
        "purple" => text.magenta(),
        "grey" | "gray" | "darkgrey" | "darkgray" => text.dimmed(),
        _ => text.normal(),
    }
}
