use analytics::{BalanceStanding, LeaderboardEntry, UserSummaryReport};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use configuration::ThemeConfig;
use core_types::{format_currency, round_for_display};
use rust_decimal::Decimal;

/// Colours used for rendering, picked from the stored theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub positive: Color,
    pub negative: Color,
    pub muted: Color,
}

impl Palette {
    pub fn for_theme(theme: &ThemeConfig) -> Self {
        if theme.dark_mode {
            Self {
                accent: Color::Cyan,
                positive: Color::Green,
                negative: Color::Red,
                muted: Color::Grey,
            }
        } else {
            Self {
                accent: Color::DarkBlue,
                positive: Color::DarkGreen,
                negative: Color::DarkRed,
                muted: Color::DarkGrey,
            }
        }
    }

    fn signed(&self, value: Decimal) -> Color {
        if value.is_sign_negative() && !round_for_display(value).is_zero() {
            self.negative
        } else {
            self.positive
        }
    }
}

/// Rank label; the podium gets medals.
pub fn rank_badge(rank: usize) -> String {
    match rank {
        1 => "🥇 1".to_string(),
        2 => "🥈 2".to_string(),
        3 => "🥉 3".to_string(),
        n => format!("#{}", n),
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(titles: &[&str], palette: &Palette) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold).fg(palette.accent))
        .collect()
}

fn money(value: Decimal) -> Cell {
    Cell::new(format_currency(value)).set_alignment(CellAlignment::Right)
}

fn signed_money(value: Decimal, palette: &Palette) -> Cell {
    money(value).fg(palette.signed(value))
}

pub fn leaderboard_table(entries: &[LeaderboardEntry], palette: &Palette) -> Table {
    let mut table = new_table();
    table.set_header(header(
        &["Rank", "User", "Net P/L", "Balance", "Sales", "Purchases", "Transactions"],
        palette,
    ));

    for entry in entries {
        let rank = Cell::new(rank_badge(entry.rank));
        let rank = if entry.rank <= 3 { rank.add_attribute(Attribute::Bold) } else { rank };
        table.add_row(vec![
            rank,
            Cell::new(format!("{} ({})", entry.name, entry.user_id)),
            signed_money(entry.net_profit_loss, palette),
            money(entry.current_balance),
            money(entry.total_sales),
            money(entry.total_purchases),
            Cell::new(entry.total_transactions).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

/// The user block, the totals and the recent transactions, one table each.
pub fn summary_tables(report: &UserSummaryReport, palette: &Palette) -> Vec<Table> {
    let info = &report.user_info;
    let summary = &report.financial_summary;
    let insights = &report.insights;

    let mut user = new_table();
    user.set_header(header(&["User", ""], palette));
    user.add_row(vec![Cell::new("Name"), Cell::new(&info.name)]);
    user.add_row(vec![Cell::new("User ID"), Cell::new(&info.user_id)]);
    user.add_row(vec![Cell::new("Email"), Cell::new(&info.email)]);
    user.add_row(vec![Cell::new("Status"), Cell::new(&info.status)]);
    user.add_row(vec![
        Cell::new("Member since"),
        match info.member_since {
            Some(since) => Cell::new(since.format("%Y-%m-%d")),
            None => Cell::new("unknown").fg(palette.muted),
        },
    ]);

    let mut totals = new_table();
    totals.set_header(header(&["Financial summary", ""], palette));
    let standing = match insights.balance_standing {
        BalanceStanding::Positive => Cell::new("positive").fg(palette.positive),
        BalanceStanding::Negative => Cell::new("negative").fg(palette.negative),
    };
    totals.add_row(vec![Cell::new("Current balance"), signed_money(summary.current_balance, palette)]);
    totals.add_row(vec![Cell::new("Total sales"), money(summary.total_sales)]);
    totals.add_row(vec![Cell::new("Total purchases"), money(summary.total_purchases)]);
    totals.add_row(vec![Cell::new("Net profit/loss"), signed_money(summary.net_profit_loss, palette)]);
    totals.add_row(vec![
        Cell::new("Transactions"),
        Cell::new(summary.total_transactions).set_alignment(CellAlignment::Right),
    ]);
    totals.add_row(vec![
        Cell::new("Average recent amount"),
        match insights.average_transaction_amount {
            Some(avg) => money(avg),
            None => Cell::new("-").fg(palette.muted),
        },
    ]);
    totals.add_row(vec![
        Cell::new("Return on purchases"),
        match insights.return_on_purchases_pct {
            Some(pct) => Cell::new(format!("{}%", round_for_display(pct)))
                .fg(palette.signed(pct))
                .set_alignment(CellAlignment::Right),
            None => Cell::new("-").fg(palette.muted),
        },
    ]);
    totals.add_row(vec![Cell::new("Balance standing"), standing]);

    let mut recent = new_table();
    recent.set_header(header(&["When", "Type", "Movie", "Seat", "Amount", "Status"], palette));
    for transaction in &report.recent_transactions {
        recent.add_row(vec![
            Cell::new(transaction.timestamp.format("%Y-%m-%d %H:%M")),
            Cell::new(transaction.transaction_type),
            Cell::new(transaction.movie.as_ref().map(|m| m.title()).unwrap_or("-")),
            Cell::new(transaction.theatre_seat.as_deref().unwrap_or("-")),
            signed_money(transaction.cash_flow(), palette),
            if transaction.is_completed() {
                Cell::new(&transaction.status)
            } else {
                Cell::new(&transaction.status).fg(palette.muted)
            },
        ]);
    }

    vec![user, totals, recent]
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::{FinancialAggregator, FinancialSummary};
    use chrono::{TimeZone, Utc};
    use core_types::{Movie, Transaction, TransactionStatus, TransactionType, User, UserStatus};
    use rust_decimal_macros::dec;

    fn alice() -> User {
        User {
            user_id: "alice".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            status: UserStatus::Active,
            member_since: None,
            initial_balance: Some(dec!(100)),
        }
    }

    #[test]
    fn test_rank_badges() {
        assert_eq!(rank_badge(1), "🥇 1");
        assert_eq!(rank_badge(3), "🥉 3");
        assert_eq!(rank_badge(4), "#4");
    }

    #[test]
    fn test_palette_follows_theme() {
        let dark = Palette::for_theme(&ThemeConfig { dark_mode: true });
        let light = Palette::for_theme(&ThemeConfig { dark_mode: false });
        assert_ne!(dark, light);
        assert_eq!(dark.signed(dec!(-0.001)), dark.positive);
        assert_eq!(dark.signed(dec!(-1)), dark.negative);
    }

    #[test]
    fn test_leaderboard_table_formats_money() {
        let mut summary = FinancialSummary::opening(dec!(1000));
        summary.net_profit_loss = dec!(-12);
        summary.current_balance = dec!(988);
        let entries = vec![LeaderboardEntry::new(1, &alice(), &summary)];

        let rendered = leaderboard_table(&entries, &Palette::for_theme(&ThemeConfig::default())).to_string();

        assert!(rendered.contains("🥇 1"));
        assert!(rendered.contains("Alice (alice)"));
        assert!(rendered.contains("-$12.00"));
        assert!(rendered.contains("$988.00"));
    }

    #[test]
    fn test_summary_tables_render_history() {
        let transaction = Transaction {
            transaction_id: "t1".to_string(),
            user_id: "alice".to_string(),
            transaction_type: TransactionType::Sale,
            amount: dec!(1234.5),
            movie: Movie::new("Dune"),
            theatre_seat: Some("A-12".to_string()),
            payment_method: None,
            description: None,
            counterparty_id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 18, 30, 0).unwrap(),
            status: TransactionStatus::Completed,
        };
        let report = FinancialAggregator::new()
            .summarize_report(&alice(), &[transaction], 5)
            .unwrap();

        let tables = summary_tables(&report, &Palette::for_theme(&ThemeConfig::default()));
        let rendered: Vec<String> = tables.iter().map(Table::to_string).collect();

        assert_eq!(rendered.len(), 3);
        assert!(rendered[0].contains("alice@example.com"));
        assert!(rendered[1].contains("$1,334.50"));
        assert!(rendered[2].contains("Dune"));
        assert!(rendered[2].contains("2024-03-01 18:30"));
    }
}
