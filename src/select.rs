//! Interactive UE selection menu.

use std::io::{self, BufRead, Write};

use crate::model::Interface;

const MENU_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Chosen(Interface),
    Quit,
}

pub fn render_menu(out: &mut impl Write, interfaces: &[Interface]) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(MENU_WIDTH))?;
    writeln!(out, "Active UE Interfaces:")?;
    writeln!(out, "{}", "-".repeat(MENU_WIDTH))?;
    for (idx, iface) in interfaces.iter().enumerate() {
        let address = iface
            .ipv4
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(out, "  {}. {:<20} IP: {}", idx + 1, iface.name, address)?;
    }
    writeln!(out, "{}", "=".repeat(MENU_WIDTH))
}

/// Show the menu and block until a valid choice, `q`, or end of input.
pub fn select_interface<R: BufRead, W: Write>(
    interfaces: &[Interface],
    mut input: R,
    mut out: W,
) -> io::Result<Selection> {
    render_menu(&mut out, interfaces)?;

    let mut line = String::new();
    loop {
        write!(out, "\nSelect UE number (or 'q' to quit): ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out, "\nCancelled by user")?;
            return Ok(Selection::Quit);
        }

        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(Selection::Quit);
        }

        match choice.parse::<usize>() {
            Ok(n) if (1..=interfaces.len()).contains(&n) => {
                return Ok(Selection::Chosen(interfaces[n - 1].clone()));
            }
            Ok(_) => writeln!(
                out,
                "Please enter a number between 1 and {}",
                interfaces.len()
            )?,
            Err(_) => writeln!(
                out,
                "Invalid input. Please enter a number between 1 and {}",
                interfaces.len()
            )?,
        }
    }
}
