//! Family-specific block extractors.
//!
//! Each extractor turns one recognized section into `(metric name, value)`
//! samples at the current timestamp index. Malformed rows are skipped with
//! a warning; a section that yields nothing leaves its metrics absent
//! rather than synthesizing zeros.

pub mod cpu_stat;
pub mod io_stat;
pub mod process_snapshot;
pub mod proxy_histogram;
pub mod table_histogram;
pub mod thread_pool;

use crate::bundle::SeriesBuilder;
use crate::scanner::{Cursor, SectionKind};
use crate::timestamp::Clock;

/// Dispatch a classified section to its extractor. The cursor sits on the
/// first line after the section header.
pub(crate) fn extract_section(
    kind: SectionKind,
    header: &str,
    cur: &mut Cursor<'_>,
    builder: &mut SeriesBuilder,
    index: usize,
    clock: &mut Clock,
) {
    match kind {
        SectionKind::ThreadPools => thread_pool::extract_pools(header, cur, builder, index, clock),
        SectionKind::MessageTypes => {
            thread_pool::extract_message_types(header, cur, builder, index, clock)
        }
        SectionKind::Meters => thread_pool::extract_meters(header, cur, builder, index, clock),
        SectionKind::CpuAverage => io_stat::extract_cpu_average(header, cur, builder, index, clock),
        SectionKind::DeviceTable => {
            io_stat::extract_device_table(header, cur, builder, index, clock)
        }
        SectionKind::PerCpu => cpu_stat::extract_per_cpu(header, cur, builder, index, clock),
        SectionKind::ProxyPercentiles => {
            proxy_histogram::extract(header, cur, builder, index, clock)
        }
        SectionKind::TableHistogram(table) => {
            table_histogram::extract(&table, cur, builder, index, clock)
        }
    }
}
