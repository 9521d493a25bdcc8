use log::{debug, warn};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
pub mod error;
pub mod plot;
pub mod window;

pub use error::RpmError;

pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// csv file written by the rpm logger, read when no other file is given
pub const DEFAULT_CSV: &str = "rpm_data.csv";

pub const TITLE: &str = "Time vs RPM";
pub const X_DESC: &str = "Time (seconds)";
pub const Y_DESC: &str = "RPM";

/// size in pixels of the image written by `plot_to_file`
pub const CHART_SIZE: (u32, u32) = (1600, 800);

/// One parsed csv row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub time: String,
    pub rpm: f64,
}

/// The main struct for the rpm time series.
/// `time` and `rpm` always have the same length and keep the csv row order.
/// `time` is kept as text, it is only used as a category on the x axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeRpm {
    pub time: Vec<String>,
    pub rpm: Vec<f64>,
}

/// Titles and legend for the rpm chart, shared by the svg/png output and the window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartStyle {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    /// series name; the legend is drawn only when this is set
    pub legend: Option<String>,
}

impl Default for ChartStyle {
    fn default() -> Self {
        ChartStyle {
            title: TITLE.to_string(),
            x_desc: X_DESC.to_string(),
            y_desc: Y_DESC.to_string(),
            legend: None,
        }
    }
}

impl ChartStyle {
    pub fn with_legend(mut self, legend: Option<String>) -> Self {
        self.legend = legend;
        self
    }
}

impl TimeRpm {
    pub fn new(capacity: usize) -> TimeRpm {
        TimeRpm {
            time: Vec::with_capacity(capacity),
            rpm: Vec::with_capacity(capacity),
        }
    }

    /// Init a TimeRpm from a csv file without header.
    /// Fails on the first row that is too short or has a non-numeric rpm,
    /// nothing is returned for the rows read before it.
    pub fn from_csv<P: AsRef<Path>>(fin: P) -> Result<TimeRpm, RpmError> {
        let fin = fin.as_ref();
        let file = match File::open(fin) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RpmError::FileNotFound(fin.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        let timerpm = TimeRpm::from_reader(file)?;
        debug!("read {} rows from {}", timerpm.len(), fin.display());
        Ok(timerpm)
    }

    /// Same as `from_csv` for any reader, the first field is the time label,
    /// the second the rpm and the remaining ones are ignored.
    /// A blank line counts as a row without fields.
    pub fn from_reader<R: Read>(mut rdr: R) -> Result<TimeRpm, RpmError> {
        // the csv reader drops blank lines, keep the bytes to find them
        let mut body = Vec::new();
        rdr.read_to_end(&mut body)?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(&body[..]);
        let mut timerpm = TimeRpm::default();
        let mut record = csv::StringRecord::new();
        loop {
            let (start, row) = record_start(&body, reader.position());
            if let Some(b'\n') | Some(b'\r') = body.get(start) {
                return Err(RpmError::MalformedRow { row, fields: 0 });
            }
            if !reader.read_record(&mut record)? {
                break;
            }
            let (time, rpm) = match (record.get(0), record.get(1)) {
                (Some(t), Some(r)) => (t, r),
                _ => {
                    return Err(RpmError::MalformedRow {
                        row,
                        fields: record.len(),
                    })
                }
            };
            let rpm = rpm
                .trim()
                .parse::<f64>()
                .map_err(|source| RpmError::NumericParse {
                    row,
                    value: rpm.to_string(),
                    source,
                })?;
            timerpm.push(Record {
                time: time.to_string(),
                rpm,
            });
        }
        Ok(timerpm)
    }

    pub fn push(&mut self, record: Record) {
        self.time.push(record.time);
        self.rpm.push(record.rpm);
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.time.iter().zip(self.rpm.iter()).map(|(t, &r)| Record {
            time: t.clone(),
            rpm: r,
        })
    }

    pub fn len(&self) -> usize {
        self.rpm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rpm.is_empty()
    }

    /// min and max of the finite rpm values
    pub fn rpm_range(&self) -> Option<(f64, f64)> {
        let finite: Vec<f64> = self.rpm.iter().copied().filter(|r| r.is_finite()).collect();
        min_and_max(&finite[..])
    }

    /// y axis limits: the rpm range with a 10% margin on each side
    pub fn rpm_axis_range(&self) -> (f64, f64) {
        match self.rpm_range() {
            None => (0., 1.),
            Some((min, max)) if min == max => (min - 1., max + 1.),
            Some((min, max)) => {
                let margin = (max - min) / 10.;
                (min - margin, max + margin)
            }
        }
    }

    /// x axis limits, half a category on each side of the row indices
    pub fn time_axis_range(&self) -> (f64, f64) {
        let last = self.len().max(1) - 1;
        (-0.5, last as f64 + 0.5)
    }

    /// (row index, rpm) points split into continuous segments,
    /// non-finite rpm values (NAN, inf) leave a gap in the line
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, &r) in self.rpm.iter().enumerate() {
            if r.is_finite() {
                current.push((i as f64, r));
            } else if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// plots the rpm time series to svg or png, depending on the extension of `fout`
    pub fn plot_to_file<P: AsRef<Path>>(&self, fout: P, style: &ChartStyle) -> Result<(), RpmError> {
        let fout = fout.as_ref();
        let ext = fout
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "svg" => {
                let root = SVGBackend::new(fout, CHART_SIZE).into_drawing_area();
                self.draw_chart(root, style).map_err(render_error)
            }
            "png" => {
                let root = BitMapBackend::new(fout, CHART_SIZE).into_drawing_area();
                self.draw_chart(root, style).map_err(render_error)
            }
            _ => Err(RpmError::UnsupportedOutput(fout.to_path_buf())),
        }
    }

    fn draw_chart<DB: DrawingBackend>(
        &self,
        root: DrawingArea<DB, Shift>,
        style: &ChartStyle,
    ) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
        let (xmin, xmax) = self.time_axis_range();
        let (ymin, ymax) = self.rpm_axis_range();
        let labels = &self.time[..];
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(&style.title, ("sans-serif", 32))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(2))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 24))
            .x_desc(&style.x_desc)
            .y_desc(&style.y_desc)
            .x_labels(self.len().clamp(1, 14)) // max number of labels
            .x_label_formatter(&|x: &f64| category_label(labels, *x))
            .y_label_formatter(&|y: &f64| format!("{:5}", y))
            .draw()?;

        for (i, segment) in self.segments().into_iter().enumerate() {
            let line = LineSeries::new(segment, BLUE.stroke_width(2));
            let anno = chart.draw_series(line)?;
            if let (0, Some(name)) = (i, &style.legend) {
                anno.label(name.as_str()).legend(|(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2))
                });
            }
        }
        if style.legend.is_some() {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(("sans-serif", 24))
                .draw()?;
        }
        root.present()?;
        Ok(())
    }
}

/// Byte offset and 1-based line of the next row after `pos`.
/// A CRLF terminator leaves its LF unread, it still belongs to the previous row.
fn record_start(body: &[u8], pos: &csv::Position) -> (usize, u64) {
    let byte = pos.byte() as usize;
    if byte > 0 && body[byte - 1] == b'\r' && body.get(byte) == Some(&b'\n') {
        (byte + 1, pos.line() + 1)
    } else {
        (byte, pos.line())
    }
}

fn render_error<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> RpmError {
    warn!("drawing failed: {}", e);
    RpmError::Render(e.to_string())
}

impl std::fmt::Display for TimeRpm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (t, r) in self.time.iter().zip(self.rpm.iter()) {
            writeln!(f, "{},{}", t, r)?
        }
        Ok(())
    }
}

/// Tick text for an x axis position; only whole row indices get their label.
pub fn category_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if (x - i).abs() > 1e-6 || i < 0. {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_in_order() {
        let tw = TimeRpm::from_reader("0,100\n1,150\n2,200\n".as_bytes()).unwrap();
        assert_eq!(tw.time, vec!["0", "1", "2"]);
        assert_eq!(tw.rpm, vec![100., 150., 200.]);
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let tw = TimeRpm::from_reader("".as_bytes()).unwrap();
        assert!(tw.is_empty());
        assert_eq!(tw.rpm_range(), None);
        assert_eq!(tw.rpm_axis_range(), (0., 1.));
        assert_eq!(tw.time_axis_range(), (-0.5, 0.5));
        assert!(tw.segments().is_empty());
    }

    #[test]
    fn non_numeric_rpm_is_an_error() {
        let err = TimeRpm::from_reader("t0,10\nt1,abc\n".as_bytes()).unwrap_err();
        match err {
            RpmError::NumericParse { row, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn short_row_is_an_error() {
        let err = TimeRpm::from_reader("0,100\n1\n2,200\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 2, fields: 1 }));
    }

    #[test]
    fn blank_line_is_a_short_row() {
        let err = TimeRpm::from_reader("0,100\n\n1,150\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 2, fields: 0 }));
        let err = TimeRpm::from_reader("0,100\r\n\r\n1,150\r\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 2, fields: 0 }));
        let err = TimeRpm::from_reader("\n0,100\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 1, fields: 0 }));
    }

    #[test]
    fn trailing_blank_line_is_a_short_row() {
        let err = TimeRpm::from_reader("0,100\n1,150\n\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 3, fields: 0 }));
        let err = TimeRpm::from_reader("0,100\r\n\r\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::MalformedRow { row: 2, fields: 0 }));
    }

    #[test]
    fn crlf_rows_keep_their_line_numbers() {
        let tw = TimeRpm::from_reader("0,100\r\n1,150\r\n".as_bytes()).unwrap();
        assert_eq!(tw.rpm, vec![100., 150.]);
        let err = TimeRpm::from_reader("0,100\r\n1,x\r\n".as_bytes()).unwrap_err();
        assert!(matches!(err, RpmError::NumericParse { row: 2, .. }));
        let tw = TimeRpm::from_reader("0,100\n1,150".as_bytes()).unwrap();
        assert_eq!(tw.len(), 2);
    }

    #[test]
    fn extra_fields_and_padding_are_ignored() {
        let tw = TimeRpm::from_reader("0.02, 1500.5 ,x\n".as_bytes()).unwrap();
        assert_eq!(tw.time, vec!["0.02"]);
        assert_eq!(tw.rpm, vec![1500.5]);
    }

    #[test]
    fn segments_break_on_nan() {
        let tw = TimeRpm::from_reader("0,1\n1,nan\n2,3\n3,4\n4,inf\n".as_bytes()).unwrap();
        assert_eq!(tw.len(), 5);
        assert_eq!(
            tw.segments(),
            vec![vec![(0., 1.)], vec![(2., 3.), (3., 4.)]]
        );
        assert_eq!(tw.rpm_range(), Some((1., 4.)));
    }

    #[test]
    fn axis_range_has_margin() {
        let tw = TimeRpm::from_reader("0,100\n1,200\n".as_bytes()).unwrap();
        assert_eq!(tw.rpm_axis_range(), (90., 210.));
        assert_eq!(tw.time_axis_range(), (-0.5, 1.5));
        let flat = TimeRpm::from_reader("0,50\n1,50\n".as_bytes()).unwrap();
        assert_eq!(flat.rpm_axis_range(), (49., 51.));
    }

    #[test]
    fn category_labels_only_on_whole_indices() {
        let labels = vec!["0.0".to_string(), "0.02".to_string()];
        assert_eq!(category_label(&labels, 1.), "0.02");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, -1.), "");
        assert_eq!(category_label(&labels, 2.), "");
    }

    #[test]
    fn display_writes_csv_rows() {
        let mut tw = TimeRpm::new(2);
        tw.push(Record {
            time: "0".to_string(),
            rpm: 10.5,
        });
        tw.push(Record {
            time: "1".to_string(),
            rpm: 20.,
        });
        assert_eq!(tw.to_string(), "0,10.5\n1,20\n");
        let back = TimeRpm::from_reader(tw.to_string().as_bytes()).unwrap();
        assert_eq!(back, tw);
    }

    #[test]
    fn min_and_max_of_empty_slice() {
        let empty: [f64; 0] = [];
        assert_eq!(min_and_max(&empty), None);
        assert_eq!(min_and_max(&[3, 1, 2]), Some((1, 3)));
    }
}
