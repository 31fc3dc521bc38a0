//! Mission phases
//!
//! The phase only changes through [`MissionPhase::transition`]; the work
//! done inside a phase lives in the navigator.

use core::fmt;

use crate::acquisition::AcquisitionOutcome;

/// Top-level navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MissionPhase {
    /// Circling the hub looking for the destination's path
    #[default]
    SelectingPath,
    /// Following the destination's path to its warehouse
    Traveling,
    /// Inside the warehouse, choosing a slot and gripping
    SearchingPallet,
    /// Heading back to the hub center
    ReturningToHub,
}

/// Mission progress events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Desired path color seen on the hub ring
    DestinationFound,
    /// Entry marker seen at the end of the path
    WarehouseReached,
    /// Acquisition attempt over, gripped or not
    AcquisitionFinished(AcquisitionOutcome),
    /// Carried pallet put down in the delivery zone
    DropOffComplete,
    /// Hub center seen on the way back
    HubReached,
}

impl MissionPhase {
    /// Process an event and return the next phase
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use MissionPhase::*;

        match (self, event) {
            (SelectingPath, DestinationFound) => Traveling,
            (Traveling, WarehouseReached) => SearchingPallet,
            // Failed attempts move on as well
            (SearchingPallet, AcquisitionFinished(_)) => ReturningToHub,
            (SearchingPallet, DropOffComplete) => ReturningToHub,
            (ReturningToHub, HubReached) => SelectingPath,

            _ => self,
        }
    }
}

impl fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MissionPhase::SelectingPath => "selecting path",
            MissionPhase::Traveling => "traveling",
            MissionPhase::SearchingPallet => "searching pallet",
            MissionPhase::ReturningToHub => "returning to hub",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let phase = MissionPhase::default();
        assert_eq!(phase, MissionPhase::SelectingPath);

        let phase = phase.transition(Event::DestinationFound);
        assert_eq!(phase, MissionPhase::Traveling);

        let phase = phase.transition(Event::WarehouseReached);
        assert_eq!(phase, MissionPhase::SearchingPallet);

        let phase = phase.transition(Event::AcquisitionFinished(AcquisitionOutcome::Gripped));
        assert_eq!(phase, MissionPhase::ReturningToHub);

        let phase = phase.transition(Event::HubReached);
        assert_eq!(phase, MissionPhase::SelectingPath);
    }

    #[test]
    fn test_failed_acquisition_moves_on() {
        let next = MissionPhase::SearchingPallet
            .transition(Event::AcquisitionFinished(AcquisitionOutcome::TimedOut));
        assert_eq!(next, MissionPhase::ReturningToHub);
    }

    #[test]
    fn test_drop_off_moves_on() {
        let next = MissionPhase::SearchingPallet.transition(Event::DropOffComplete);
        assert_eq!(next, MissionPhase::ReturningToHub);
    }

    #[test]
    fn test_out_of_order_events_ignored() {
        let cases = [
            (MissionPhase::SelectingPath, Event::WarehouseReached),
            (MissionPhase::SelectingPath, Event::HubReached),
            (MissionPhase::Traveling, Event::DestinationFound),
            (MissionPhase::Traveling, Event::HubReached),
            (MissionPhase::SearchingPallet, Event::HubReached),
            (MissionPhase::ReturningToHub, Event::DropOffComplete),
        ];

        for (phase, event) in cases {
            assert_eq!(phase.transition(event), phase);
        }
    }
}
