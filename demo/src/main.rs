use dotenv::dotenv;
use linelcd_gpio::gpiod::GpiodDriver;
use linelcd_gpio::lcd::hd44780::{BusConfig, Font, GpioHD44780Driver, LcdConfig};
use linelcd_gpio::raw::RawGpioDriver;
use linelcd_gpio::{PinController, StdDelay};
use log::{debug, info};
use std::env::var;
use sysinfo::System;

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn parse_pin_bus(pin_str: &str) -> eyre::Result<Vec<usize>> {
    let pins = pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?;
    if pins.len() != 4 && pins.len() != 8 {
        return Err(eyre::eyre!("Invalid number of data pins: {}", pins.len()));
    }
    Ok(pins)
}

fn parse_font(font_str: &str) -> eyre::Result<Font> {
    match font_str {
        "5x8" => Ok(Font::Font5x8),
        "5x10" => Ok(Font::Font5x10),
        other => Err(eyre::eyre!("Unknown font: {}", other)),
    }
}

fn var_or(name: &str, default: &str) -> String {
    var(name).unwrap_or_else(|_| default.to_string())
}

fn load_config() -> eyre::Result<LcdConfig> {
    let e_pin_no: usize = var("LCD_PIN_E")?.parse()?;
    let rs_pin_no: usize = var("LCD_PIN_RS")?.parse()?;
    let rw_pin_no: Option<usize> = match var("LCD_PIN_RW") {
        Ok(s) if !s.trim().is_empty() => Some(s.trim().parse()?),
        _ => None,
    };
    let data_pin_nos = parse_pin_bus(&var("LCD_PINS_DATA")?)?;

    let rows: usize = var_or("LCD_ROWS", "2").parse()?;
    let columns: usize = var_or("LCD_COLUMNS", "16").parse()?;
    let font = parse_font(&var_or("LCD_FONT", "5x8"))?;

    info!(
        "LCD @ E: {}, RS: {}, RW: {:?}, Data: {:?}, {}x{}",
        e_pin_no, rs_pin_no, rw_pin_no, data_pin_nos, columns, rows
    );

    let bus = BusConfig::new(&data_pin_nos, e_pin_no, rs_pin_no, rw_pin_no)?;
    Ok(LcdConfig::new(bus, rows, columns).with_font(font))
}

fn run<P: PinController>(pins: P, config: LcdConfig) -> eyre::Result<()> {
    let mut lcd = GpioHD44780Driver::new(config, pins, StdDelay)?;

    // The controller was probably not power-cycled, so its power-on reset can't be relied on
    lcd.init()?;
    lcd.start()?;
    debug!("{:?} initialized.", lcd);

    for day in DAYS {
        info!("Pushing {}", day);
        lcd.push_line_animated(day)?;
    }

    lcd.flash(2)?;
    lcd.clear()?;

    info!("Done.");
    Ok(())
}

fn main() -> eyre::Result<()> {
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!(
        "Hello, {}!",
        System::name().as_deref().unwrap_or(UNKNOWN_STR)
    );
    info!(
        "System ver {} kernel ver {}",
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );
    info!("Architecture {}", System::cpu_arch());

    let config = load_config()?;

    let backend = var_or("LCD_GPIO_BACKEND", "gpiomem");
    debug!("Initializing GPIO driver ({})...", backend);
    match backend.as_str() {
        "gpiomem" => run(RawGpioDriver::new_gpiomem()?, config),
        "mem" => run(RawGpioDriver::new_mem()?, config),
        path => run(GpiodDriver::open(path)?, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pin_lists() {
        assert_eq!(parse_pin_bus("10, 11, 12, 13").unwrap(), [10, 11, 12, 13]);
        assert_eq!(parse_pin_bus("0;1;2;3 4 5 6 7").unwrap().len(), 8);
        assert!(parse_pin_bus("1,2,3").is_err());
        assert!(parse_pin_bus("1,2,x,4").is_err());
    }

    #[test]
    fn parses_fonts() {
        assert_eq!(parse_font("5x10").unwrap(), Font::Font5x10);
        assert!(parse_font("6x8").is_err());
    }
}
