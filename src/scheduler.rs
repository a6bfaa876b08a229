use crate::protocol::Command;
use heapless::Vec;
use serde::{Deserialize, Serialize};

const MAX_SCHEDULED_COMMANDS: usize = 32;

// Tolerance for clock skew when validating execution times
const PAST_TOLERANCE_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub command: Command,
    pub execution_time: u64,
    pub scheduled_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SchedulerStats {
    pub total_scheduled: u32,
    pub total_released: u32,
    pub total_expired: u32,
    pub currently_scheduled: u8,
}

/// Time-tagged command queue. Commands are held until their execution
/// time arrives and released in chronological order.
#[derive(Debug)]
pub struct CommandScheduler {
    queue: Vec<ScheduledCommand, MAX_SCHEDULED_COMMANDS>,
    stats: SchedulerStats,
    command_timeout_seconds: u64,
}

impl CommandScheduler {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            stats: SchedulerStats::default(),
            command_timeout_seconds: 3600,
        }
    }

    pub fn schedule_command(
        &mut self,
        command: Command,
        current_time: u64,
    ) -> Result<(), &'static str> {
        let execution_time = command.execution_time.unwrap_or(current_time);

        if execution_time > current_time + (self.command_timeout_seconds * 1000) {
            return Err("Execution time too far in future");
        }
        if execution_time < current_time.saturating_sub(PAST_TOLERANCE_MS) {
            return Err("Execution time in the past");
        }
        if self.queue.is_full() {
            return Err("Scheduler queue full");
        }

        let entry = ScheduledCommand {
            command,
            execution_time,
            scheduled_at: current_time,
        };

        // Keep the queue sorted by execution time. heapless::Vec has no
        // insert, so push then sort.
        let needs_sort = self
            .queue
            .last()
            .is_some_and(|tail| tail.execution_time > execution_time);
        let _ = self.queue.push(entry);
        if needs_sort {
            self.queue.sort_by_key(|cmd| cmd.execution_time);
        }

        self.stats.total_scheduled += 1;
        self.stats.currently_scheduled = self.queue.len() as u8;

        Ok(())
    }

    /// Release commands whose execution time has arrived.
    pub fn get_ready_commands(&mut self, current_time: u64) -> Vec<Command, 8> {
        let mut ready: Vec<Command, 8> = Vec::new();

        while let Some(head) = self.queue.first() {
            if head.execution_time > current_time || ready.is_full() {
                break;
            }
            // remove(0) keeps the remaining queue in chronological order
            let entry = self.queue.remove(0);
            let _ = ready.push(entry.command);
            self.stats.total_released += 1;
        }

        self.stats.currently_scheduled = self.queue.len() as u8;

        ready
    }

    /// Drop commands that have sat in the queue past the timeout.
    pub fn cleanup_expired_commands(&mut self, current_time: u64) {
        let timeout_ms = self.command_timeout_seconds * 1000;
        let initial_count = self.queue.len();

        self.queue
            .retain(|cmd| current_time.saturating_sub(cmd.scheduled_at) <= timeout_ms);

        self.stats.total_expired += (initial_count - self.queue.len()) as u32;
        self.stats.currently_scheduled = self.queue.len() as u8;
    }

    pub fn get_stats(&self) -> &SchedulerStats {
        &self.stats
    }

    pub fn get_scheduled_commands(&self) -> &[ScheduledCommand] {
        &self.queue
    }

    pub fn clear_all_scheduled(&mut self) {
        let cleared = self.queue.len();
        self.queue.clear();
        self.stats.total_expired += cleared as u32;
        self.stats.currently_scheduled = 0;
    }

    pub fn set_timeout_seconds(&mut self, timeout_seconds: u64) {
        self.command_timeout_seconds = timeout_seconds;
    }
}

impl Default for CommandScheduler {
    fn default() -> Self {
        Self::new()
    }
}
