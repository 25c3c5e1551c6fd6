/// This macro helps defining a set of functional units composing the CPU.
///
/// During a CPU cycle,
/// 1. Signals in stage registers, which are the result of the previous cycle,
///    are provided for this cycle.
/// 2. Signals start from the stage registers or the outputs of a unit, go
///    through muxes and wires, finally reach the inputs of the next units.
/// 3. On receiving input signals, a unit processes them and updates its
///    output signals. Outputs that a unit leaves untouched keep their value,
///    which is how edge-triggered units (e.g. the synchronous RAM) hold a
///    registered output.
///
/// Each unit is declared as
///
/// ```text
/// UnitName short_name {
///     .input(a: T, b: T)
///     .output(c: T)
///     internal_state: S
/// } { body }
/// ```
///
/// Inside the body, inputs are bound by value, outputs as `&mut` and the
/// internal states as `&mut`.
#[macro_export]
macro_rules! define_units {
    ($(
        $(#[$att:meta])*
        $unit_name:ident $unit_short_name:ident {
            $(.input( $($(#[$input_att:meta])* $iname:ident : $itype:ty),* $(,)? ))?
            $(.output( $($(#[$output_att:meta])* $oname:ident : $otype:ty),* $(,)? ))?
            $($sname:ident : $stype:ty),* $(,)?
        } $body:block
    )*) => {
        /// Input signals of units
        pub mod unit_in {
            #![allow(unused_imports)]
            use super::*;
            $(#[derive(Default, Debug, Clone)]
            pub struct $unit_name {
                $($($(#[$input_att])* pub $iname: $itype, )*)?
            })*
        }
        /// Output signals of units
        pub mod unit_out {
            #![allow(unused_imports)]
            use super::*;
            $(#[derive(Default, Debug, Clone)]
            pub struct $unit_name {
                $($($(#[$output_att])* pub $oname: $otype, )*)?
            })*
        }
        #[derive(Default, Debug, Clone)]
        pub struct UnitInputSignal {
            $(pub $unit_short_name: unit_in::$unit_name),*
        }
        #[derive(Default, Debug, Clone)]
        pub struct UnitOutputSignal {
            $(pub $unit_short_name: unit_out::$unit_name),*
        }

        $( #[allow(unused)]
        $(#[$att])*
        pub struct $unit_name {
            $(pub $sname: $stype ),*
        } )*

        $( impl $unit_name {
            /// Process the input signals and update the output signals.
            #[allow(unused)]
            pub fn trigger(Self{ $( $sname ),* }: &mut Self,
                inputs: unit_in::$unit_name,
                outputs: &mut unit_out::$unit_name,
            ) {
                let unit_in::$unit_name{$($( $iname, )*)? .. } = inputs;
                let unit_out::$unit_name{$($( $oname, )*)? .. } = outputs;

                $body
            }
        } )*

        /// All hardware units of the CPU.
        pub struct Units {
            $( pub $unit_short_name: $unit_name, )*
        }
    };
}

/// This macro defines the clocked registers of a CPU. Every register group
/// has a reset value for each of its fields; `StageState::default()` is the
/// state of the machine right after reset.
///
/// The simulator keeps two copies: the current one (read by the
/// combinational logic during a cycle) and the next one (written by it).
/// The next copy replaces the current one on the clock edge.
#[macro_export]
macro_rules! define_stages {
    ($(
        $(#[$att:meta])*
        $stage_name:ident $stage_short_name:ident {
            $( $(#[$field_att:meta])* $fname:ident : $ftype:ty = $fdefault:expr ),* $(,)?
        }
    )*) => {
        /// Signals stored in stage registers
        pub mod stage {
            #![allow(unused_imports)]
            use super::*;
            $( $(#[$att])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, ::serde::Serialize)]
            pub struct $stage_name {
                $( $(#[$field_att])* pub $fname: $ftype, )*
            }
            impl Default for $stage_name {
                fn default() -> Self {
                    Self { $( $fname: $fdefault, )* }
                }
            } )*
        }
        /// All stage registers.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ::serde::Serialize)]
        pub struct StageState {
            $( pub $stage_short_name: stage::$stage_name, )*
        }
    };
}
