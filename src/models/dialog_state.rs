/// Состояние диалога в конкретном чате.
///
/// Отсутствие записи в карте сессий означает "idle": бот никакого ввода
/// не ожидает. Контекст (id настраиваемого растения) хранится прямо
/// в варианте, а не в отдельном глобальном поле.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Ждём название нового растения.
    AwaitingPlantName,
    /// Ждём выбор интервала полива (кнопка или свободный ввод).
    AwaitingIntervalChoice { plant_id: i64 },
}

/// Предустановленные интервалы полива, в днях.
pub const INTERVAL_PRESETS: [i64; 4] = [1, 3, 7, 14];

const INTERVAL_MIN: i64 = 1;
const INTERVAL_MAX: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    NotANumber,
    OutOfRange,
}

impl std::fmt::Display for IntervalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalError::NotANumber => write!(f, "Пожалуйста, введите число"),
            IntervalError::OutOfRange => {
                write!(f, "Введите число от {} до {} дней", INTERVAL_MIN, INTERVAL_MAX)
            }
        }
    }
}

/// Разбор свободного ввода интервала: целое число от 1 до 30.
pub fn parse_custom_interval(text: &str) -> Result<i64, IntervalError> {
    let interval: i64 = text.trim().parse().map_err(|_| IntervalError::NotANumber)?;
    if !(INTERVAL_MIN..=INTERVAL_MAX).contains(&interval) {
        return Err(IntervalError::OutOfRange);
    }
    Ok(interval)
}
