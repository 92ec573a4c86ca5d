// Domain errors surfaced to dashboard users
use thiserror::Error;

/// Input rejected before any network call or computation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("La semana final no puede ser anterior a la semana inicial")]
    InvertedWeekRange,
    #[error("El rango seleccionado no puede superar {max} semanas")]
    WeekSpanTooLong { max: u32 },
    #[error("Las semanas deben estar entre 1 y 53")]
    WeekOutOfRange,
    #[error("El tamaño de ventana debe estar entre {min} y {max} horas")]
    WindowOutOfRange { min: u32, max: u32 },
    #[error("El año {0} no es válido")]
    InvalidYear(i32),
    #[error("Las horas nocturnas deben estar entre 0 y 23")]
    NightHourOutOfRange,
    #[error("La fecha final no puede ser anterior a la fecha inicial")]
    InvertedDateRange,
    #[error("El rango de fechas no puede superar {max_weeks} semanas")]
    DateSpanTooLong { max_weeks: u32 },
    #[error("El campo '{0}' es obligatorio")]
    MissingField(&'static str),
    #[error("Formato de vista no válido: {0}")]
    UnknownViewMode(String),
    #[error("No hay datos para analizar")]
    EmptySeries,
}

/// Workbook could not be turned into a time series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ImportError {
    #[error("El archivo debe contener al menos 2 filas (encabezado y datos)")]
    TooFewRows,
    #[error("No se encontró una columna de fecha o timestamp")]
    MissingTimestampColumn,
    #[error("No se encontró una columna de valores")]
    MissingValueColumn,
    #[error("El archivo no contiene filas válidas")]
    NoValidRows,
    #[error("Formato de archivo no soportado: use .xlsx o .xls")]
    UnsupportedFormat,
    #[error("No se recibió ningún archivo")]
    MissingFile,
    #[error("El libro no contiene hojas")]
    NoSheets,
    #[error("No se pudo leer el archivo: {0}")]
    Unreadable(String),
}
